//! # tailrisk Math
//!
//! Numerical kernels shared by the tailrisk estimation and risk crates.
//!
//! This crate provides:
//!
//! - **Solvers**: Brent's bracketing root finder used to invert
//!   distribution functions
//! - **Optimization**: The pluggable [`optimization::Optimizer`] capability and
//!   a bounded Nelder-Mead simplex
//! - **Linear Algebra**: Least squares and symmetric inversion on `nalgebra`
//! - **Statistics**: Sample moments, empirical quantiles and autocorrelation
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: identical inputs give bit-identical outputs
//! - **Bounded**: every iterative routine has an explicit iteration budget
//! - **Black-box objectives**: optimizers only see `Fn(&[f64]) -> f64`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;
pub mod solvers;
pub mod stats;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::optimization::{
        Bounds, NelderMead, OptimizationConfig, OptimizationResult, Optimizer,
    };
    pub use crate::solvers::{brent, expand_bracket, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};
