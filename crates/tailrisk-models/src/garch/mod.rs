//! ARMA(p,q)-GARCH(r,s) models.
//!
//! ```text
//! (x_t - mu) = sum phi_i (x_{t-i} - mu) + sum theta_j a_{t-j} + a_t
//! a_t        = sigma_t z_t
//! sigma_t^2  = omega + sum alpha_i a_{t-i}^2 + sum beta_j sigma_{t-j}^2
//! ```
//!
//! [`GarchEstimator`] maximizes the conditional log-likelihood
//! `sum_t [ln f(a_t / sigma_t) - ln(sigma_t^2) / 2]` over box-bounded
//! parameters. Stationarity (`sum alpha + sum beta < 1`) is reported on the
//! [`FittedModel`] but not imposed during estimation.

mod estimator;
mod model;
mod params;
pub(crate) mod recursion;

pub use estimator::{default_optimization_config, filter, GarchEstimator, MIN_EXCESS_OBSERVATIONS};
pub use model::{FitSummary, FittedModel, ParameterEstimate};
pub use params::GarchParameters;
