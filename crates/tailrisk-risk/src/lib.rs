//! # tailrisk-risk
//!
//! Conditional value-at-risk in the McNeil-Frey GARCH-EVT style:
//!
//! - **EVT**: generalized Pareto fit to the upper tail of standardized
//!   residuals, tail quantiles and expected shortfall
//! - **Forecast**: multi-step VaR/ES paths and rolling out-of-sample
//!   one-step forecasts with periodic re-estimation
//! - **Bootstrap**: filtered historical simulation
//! - **Backtest**: Kupiec POF and Christoffersen coverage tests
//! - **Pipeline**: every stage driven by one `PipelineConfig`
//!
//! All models work on the loss series (negated returns), so VaR is an upper
//! quantile and a day is covered when `loss <= VaR`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tailrisk_risk::prelude::*;
//!
//! let prices = PriceSeries::from_csv_path("spx.csv", "adjusted_close")?;
//! let report = Pipeline::new(PipelineConfig::default())?.run_prices(&prices)?;
//! println!("{}: VaR {:.3}", report.spec(), report.forecast.steps[0].var);
//! println!("Kupiec p-value {:.3}", report.backtest.kupiec.pof.p_value);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backtest;
pub mod bootstrap;
mod error;
pub mod evt;
pub mod forecast;
pub mod pipeline;

pub use backtest::{BacktestResult, Backtester, ChristoffersenTest, KupiecTest};
pub use bootstrap::{BootstrapForecast, FilteredHistoricalSimulation};
pub use error::{PipelineError, RiskError, RiskResult, Stage};
pub use evt::{TailEstimator, TailModel};
pub use forecast::{
    ForecastPath, RollingBacktest, RollingForecast, RollingForecaster, VarForecast, VarForecaster,
};
pub use pipeline::{Pipeline, PipelineReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backtest::{coverage_indicators, kupiec_pof, BacktestResult, Backtester};
    pub use crate::bootstrap::FilteredHistoricalSimulation;
    pub use crate::error::{PipelineError, RiskError, RiskResult};
    pub use crate::evt::{TailEstimator, TailModel};
    pub use crate::forecast::{ForecastPath, RollingForecaster, VarForecaster};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use tailrisk_config::PipelineConfig;
    pub use tailrisk_core::{PriceSeries, ReturnSeries};
}
