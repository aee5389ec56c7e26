//! Bracketing root finders.
//!
//! Used to invert monotone functions such as cumulative distribution
//! functions that have no closed-form quantile:
//!
//! - [`brent`]: inverse quadratic interpolation with bisection safeguard
//! - [`expand_bracket`]: grows an interval outward until it brackets a root
//!
//! # Example: inverting a CDF
//!
//! ```rust
//! use tailrisk_math::solvers::{brent, expand_bracket, SolverConfig};
//!
//! // Logistic CDF, quantile at 0.9 is ln(9)
//! let cdf = |x: f64| 1.0 / (1.0 + (-x).exp());
//! let target = |x: f64| cdf(x) - 0.9;
//!
//! let (a, b) = expand_bracket(&target, -1.0, 1.0, 50).unwrap();
//! let result = brent(target, a, b, &SolverConfig::default()).unwrap();
//! assert!((result.root - 9f64.ln()).abs() < 1e-8);
//! ```

mod brent;

pub use brent::brent;

use crate::error::{MathError, MathResult};

/// Default tolerance for root finding.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Default maximum iterations for root finding.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Tolerance on the bracket width and the residual.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Result of a root-finding iteration.
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Function value at the root.
    pub residual: f64,
}

/// Expands `[a, b]` geometrically until `f` changes sign across it.
///
/// Each round doubles the width and moves the end with the smaller
/// absolute value outward.
pub fn expand_bracket<F>(f: &F, a: f64, b: f64, max_rounds: u32) -> MathResult<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    if !(a < b) {
        return Err(MathError::invalid_input("bracket requires a < b"));
    }

    let mut lo = a;
    let mut hi = b;
    let mut f_lo = f(lo);
    let mut f_hi = f(hi);

    for _ in 0..max_rounds {
        if f_lo * f_hi <= 0.0 {
            return Ok((lo, hi));
        }
        let width = hi - lo;
        if f_lo.abs() < f_hi.abs() {
            lo -= width;
            f_lo = f(lo);
        } else {
            hi += width;
            f_hi = f(hi);
        }
    }

    Err(MathError::InvalidBracket {
        a: lo,
        b: hi,
        fa: f_lo,
        fb: f_hi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_expand_bracket_moves_toward_root() {
        let f = |x: f64| x - 37.0;
        let (a, b) = expand_bracket(&f, 0.0, 1.0, 20).unwrap();
        assert!(a <= 37.0 && b >= 37.0);

        let root = brent(f, a, b, &SolverConfig::default()).unwrap().root;
        assert_relative_eq!(root, 37.0, epsilon = 1e-10);
    }

    #[test]
    fn test_expand_bracket_gives_up() {
        let f = |x: f64| x * x + 1.0;
        assert!(expand_bracket(&f, -1.0, 1.0, 5).is_err());
    }

    #[test]
    fn test_expand_bracket_rejects_reversed_interval() {
        let f = |x: f64| x;
        assert!(expand_bracket(&f, 1.0, -1.0, 5).is_err());
    }
}
