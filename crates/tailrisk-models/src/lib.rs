//! # tailrisk-models
//!
//! Conditional volatility models for the tailrisk pipeline:
//!
//! - **Distributions**: standardized normal, Student-t and GED innovations
//!   and their Fernandez-Steel skewed variants
//! - **GARCH**: ARMA(p,q)-GARCH(r,s) maximum-likelihood estimation,
//!   filtering with fixed parameters, Hessian standard errors
//! - **Criteria**: AIC, AICC, SBC and HQC
//! - **Selection**: grid search over specifications with argmin reduction
//! - **Diagnostics**: Ljung-Box, ARCH-LM and Jarque-Bera tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use tailrisk_models::prelude::*;
//!
//! let spec = ModelSpec::new(1, 0, 1, 1, DistributionFamily::StudentT);
//! let fit = GarchEstimator::new().fit(&spec, losses.values())?;
//! println!("persistence = {:.4}", fit.persistence());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod criteria;
pub mod diagnostics;
pub mod distributions;
pub mod error;
pub mod garch;
pub mod selection;

pub use criteria::InformationCriteria;
pub use diagnostics::{ResidualDiagnostics, TestStatistic};
pub use distributions::{Innovation, InnovationDistribution};
pub use error::{ModelError, ModelResult};
pub use garch::{
    filter, FitSummary, FittedModel, GarchEstimator, GarchParameters, ParameterEstimate,
};
pub use selection::{ModelSelector, ModelSpace, Selection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::criteria::InformationCriteria;
    pub use crate::diagnostics::ResidualDiagnostics;
    pub use crate::distributions::{Innovation, InnovationDistribution};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::garch::{filter, FitSummary, FittedModel, GarchEstimator, GarchParameters};
    pub use crate::selection::{Candidate, ModelSelector, ModelSpace, Selection};
    pub use tailrisk_core::{DistributionFamily, ModelSpec};
}
