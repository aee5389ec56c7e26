//! Error types for risk forecasting and backtesting.

use std::fmt;

use tailrisk_config::ConfigError;
use tailrisk_core::{CoreError, ModelSpec};
use tailrisk_math::MathError;
use tailrisk_models::ModelError;
use thiserror::Error;

/// Result alias for risk operations.
pub type RiskResult<T> = Result<T, RiskError>;

/// Errors that can occur during tail estimation, forecasting and backtesting.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Too few residuals above the threshold to fit a GPD.
    #[error("insufficient tail data: need at least {required} exceedances, got {actual}")]
    InsufficientTailData {
        /// Minimum exceedances.
        required: usize,
        /// Exceedances found.
        actual: usize,
    },

    /// Variance forecasts need `sum(alpha) + sum(beta) < 1`.
    #[error("{spec} is not covariance stationary (persistence {persistence:.6})")]
    NonStationaryModel {
        /// Specification of the offending fit.
        spec: ModelSpec,
        /// `sum(alpha) + sum(beta)`.
        persistence: f64,
    },

    /// Realized losses and forecasts do not line up.
    #[error("misaligned series: {0}")]
    MisalignedSeries(String),

    /// Invalid input parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model estimation error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Data error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Numerical kernel error.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RiskError {
    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Creates a misaligned series error.
    pub fn misaligned(reason: impl Into<String>) -> Self {
        Self::MisalignedSeries(reason.into())
    }
}

/// Pipeline stage, used to locate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Building returns from prices.
    Returns,
    /// Fitting and ranking candidate specifications.
    Selection,
    /// Final estimation of the selected specification.
    Estimation,
    /// Residual diagnostics.
    Diagnostics,
    /// GPD fit to standardized residuals.
    Tail,
    /// VaR and ES forecast path.
    Forecast,
    /// Filtered historical simulation.
    Bootstrap,
    /// Rolling forecasts and coverage tests.
    Backtest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Returns => "returns",
            Stage::Selection => "selection",
            Stage::Estimation => "estimation",
            Stage::Diagnostics => "diagnostics",
            Stage::Tail => "tail",
            Stage::Forecast => "forecast",
            Stage::Bootstrap => "bootstrap",
            Stage::Backtest => "backtest",
        };
        f.write_str(name)
    }
}

/// A [`RiskError`] tagged with the pipeline stage and, when one was
/// involved, the model specification.
#[derive(Debug, Error)]
pub struct PipelineError {
    /// Failing stage.
    pub stage: Stage,
    /// Specification being processed, if any.
    pub spec: Option<ModelSpec>,
    /// Underlying error.
    #[source]
    pub source: RiskError,
}

impl PipelineError {
    /// Wraps `source` for `stage`.
    pub fn new(stage: Stage, spec: Option<ModelSpec>, source: impl Into<RiskError>) -> Self {
        Self {
            stage,
            spec,
            source: source.into(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            Some(spec) => write!(f, "{} stage failed for {spec}: {}", self.stage, self.source),
            None => write!(f, "{} stage failed: {}", self.stage, self.source),
        }
    }
}
