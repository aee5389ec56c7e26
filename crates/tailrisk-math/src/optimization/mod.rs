//! Bounded minimization.
//!
//! Estimators in the workspace never call a concrete algorithm directly.
//! They are generic over [`Optimizer`], which sees the objective as a black
//! box `Fn(&[f64]) -> f64` together with box [`Bounds`]. The crate ships
//! [`NelderMead`], a derivative-free simplex search with optional restarts.
//!
//! Non-finite objective values are treated as `+inf`, so an objective can
//! signal an infeasible region simply by returning `f64::INFINITY`.

mod hessian;
mod nelder_mead;

pub use hessian::numerical_hessian;
pub use nelder_mead::NelderMead;

use crate::error::{MathError, MathResult};

/// Configuration for optimization algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationConfig {
    /// Relative tolerance on the objective spread.
    pub tolerance: f64,
    /// Absolute tolerance on the parameter spread.
    pub parameter_tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            parameter_tolerance: 1e-7,
            max_iterations: 5_000,
        }
    }
}

impl OptimizationConfig {
    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the objective tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best parameters found.
    pub parameters: Vec<f64>,
    /// Objective value at `parameters`.
    pub objective_value: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Whether the stopping criterion was met within the budget.
    pub converged: bool,
}

/// Box constraints `lower[i] <= x[i] <= upper[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Creates bounds from per-coordinate limits.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> MathResult<Self> {
        if lower.len() != upper.len() {
            return Err(MathError::DimensionMismatch {
                rows1: lower.len(),
                cols1: 1,
                rows2: upper.len(),
                cols2: 1,
            });
        }
        if let Some(i) = (0..lower.len()).find(|&i| !(lower[i] <= upper[i])) {
            return Err(MathError::invalid_input(format!(
                "bound {i}: lower {} exceeds upper {}",
                lower[i], upper[i]
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Unconstrained bounds in `n` dimensions.
    #[must_use]
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// True for zero-dimensional bounds.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Lower limits.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper limits.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Clamps `x` into the box in place.
    pub fn project(&self, x: &mut [f64]) {
        for ((xi, lo), hi) in x.iter_mut().zip(&self.lower).zip(&self.upper) {
            *xi = xi.clamp(*lo, *hi);
        }
    }

    /// True when every coordinate lies inside the box.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.len()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(xi, (lo, hi))| *xi >= *lo && *xi <= *hi)
    }
}

/// Minimizes a black-box objective subject to box bounds.
pub trait Optimizer: Send + Sync {
    /// Minimizes `f` starting from `initial`.
    ///
    /// Implementations project `initial` onto `bounds` first and never
    /// evaluate `f` outside the box. A run that exhausts its budget returns
    /// `Ok` with `converged == false`; errors are reserved for unusable input.
    fn minimize<F>(
        &self,
        f: F,
        initial: &[f64],
        bounds: &Bounds,
        config: &OptimizationConfig,
    ) -> MathResult<OptimizationResult>
    where
        F: Fn(&[f64]) -> f64;

    /// Returns the name of the algorithm.
    fn name(&self) -> &'static str;
}

/// Maps NaN and `-inf` artefacts to `+inf` so they always lose comparisons.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_nan() || value == f64::NEG_INFINITY {
        f64::INFINITY
    } else {
        value
    }
}

pub(crate) fn check_dimensions(initial: &[f64], bounds: &Bounds) -> MathResult<()> {
    if initial.is_empty() {
        return Err(MathError::invalid_input("cannot optimize zero parameters"));
    }
    if initial.len() != bounds.len() {
        return Err(MathError::DimensionMismatch {
            rows1: initial.len(),
            cols1: 1,
            rows2: bounds.len(),
            cols2: 1,
        });
    }
    Ok(())
}
