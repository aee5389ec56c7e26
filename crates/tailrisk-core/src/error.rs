//! Error types for series construction and data loading.

use thiserror::Error;

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building price and return series.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or insufficient input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A data row could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number in the source file.
        line: u64,
        /// What went wrong.
        reason: String,
    },

    /// CSV reader error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
