//! Error types for model estimation and selection.

use tailrisk_core::{CoreError, ModelSpec};
use tailrisk_math::MathError;
use thiserror::Error;

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by distributions, estimators and the selector.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The likelihood optimization did not converge.
    #[error("{spec}: optimizer did not converge after {iterations} iterations ({reason})")]
    NonConvergence {
        /// Specification being fitted.
        spec: ModelSpec,
        /// Iterations spent.
        iterations: u32,
        /// What stopped the run.
        reason: String,
    },

    /// Too few observations for the requested model.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Minimum observations.
        required: usize,
        /// Observations provided.
        actual: usize,
    },

    /// Invalid parameter or argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every candidate in the model space failed to fit.
    #[error("no admissible model among {attempted} candidate specifications")]
    NoAdmissibleModel {
        /// Number of specifications tried.
        attempted: usize,
    },

    /// Numerical kernel error.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl ModelError {
    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Whether the error is an optimizer failure for one specification.
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence { .. })
    }

    /// Whether the error excludes one candidate of a grid rather than the
    /// whole run: non-convergence, or a specification too large for the
    /// sample.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            Self::NonConvergence { .. } | Self::InsufficientData { .. }
        )
    }
}

impl From<CoreError> for ModelError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
