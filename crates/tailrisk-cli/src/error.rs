//! CLI error types.

use tailrisk_core::CoreError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed `p,q,r,s,family` specification.
    #[error("Invalid model specification '{0}'. Use p,q,r,s,family, e.g. 0,0,1,1,std.")]
    InvalidSpec(String),

    /// Malformed `p,q,r,s` order bounds.
    #[error("Invalid maximum orders '{0}'. Use p,q,r,s, e.g. 1,1,2,2.")]
    InvalidOrders(String),

    /// Price file could not be turned into returns.
    #[error("Data error: {0}")]
    Data(#[from] CoreError),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
