//! Peaks-over-threshold tail estimation.
//!
//! Standardized residuals above a high empirical threshold `u` are modelled
//! by a generalized Pareto distribution with shape `xi` and scale `beta`:
//!
//! ```text
//! G(y) = 1 - (1 + xi y / beta)^(-1/xi)     xi != 0
//! G(y) = 1 - exp(-y / beta)                xi == 0
//! ```
//!
//! The tail estimator of the residual quantile combines the empirical
//! exceedance rate `N_u / n` with `G`, which is what makes the quantile
//! extrapolate beyond the largest observed residual.

use serde::{Deserialize, Serialize};
use tailrisk_math::optimization::{Bounds, NelderMead, OptimizationConfig, Optimizer};
use tailrisk_math::{stats, MathError};
use tracing::debug;

use crate::error::{RiskError, RiskResult};

/// Default share of residuals treated as the tail.
pub const DEFAULT_TAIL_FRACTION: f64 = 0.1;

/// Default minimum number of exceedances.
pub const DEFAULT_MIN_EXCEEDANCES: usize = 20;

/// Shapes closer to zero than this use the exponential limit.
const SHAPE_ZERO: f64 = 1e-9;
const SHAPE_MIN: f64 = -0.5;
const SHAPE_MAX: f64 = 0.99;

/// Fitted generalized Pareto tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailModel {
    /// GPD shape `xi`.
    pub shape: f64,
    /// GPD scale `beta`.
    pub scale: f64,
    /// Threshold `u`.
    pub threshold: f64,
    /// Residuals used, `n`.
    pub num_obs: usize,
    /// Residuals above the threshold, `N_u`.
    pub num_exceedances: usize,
    /// Maximized GPD log-likelihood.
    pub log_likelihood: f64,
}

impl TailModel {
    /// Lowest level the tail estimator covers, `1 - N_u / n`.
    pub fn min_level(&self) -> f64 {
        1.0 - self.num_exceedances as f64 / self.num_obs as f64
    }

    /// Residual quantile at level `p`.
    ///
    /// # Errors
    ///
    /// Fails unless `1 - N_u / n <= p < 1`.
    pub fn quantile(&self, p: f64) -> RiskResult<f64> {
        if !(p < 1.0 && p >= self.min_level()) {
            return Err(RiskError::invalid_input(format!(
                "level {p} outside the modelled tail [{}, 1)",
                self.min_level()
            )));
        }
        let ratio = self.num_obs as f64 / self.num_exceedances as f64 * (1.0 - p);
        let q = if self.shape.abs() < SHAPE_ZERO {
            self.threshold - self.scale * ratio.ln()
        } else {
            self.threshold + self.scale / self.shape * (ratio.powf(-self.shape) - 1.0)
        };
        Ok(q)
    }

    /// Expected shortfall `E[Z | Z > q_p]` at level `p`.
    ///
    /// # Errors
    ///
    /// As [`TailModel::quantile`]; also fails when `xi >= 1`, where the
    /// tail mean is infinite.
    pub fn expected_shortfall(&self, p: f64) -> RiskResult<f64> {
        if self.shape >= 1.0 {
            return Err(RiskError::invalid_input(format!(
                "expected shortfall is infinite for shape {}",
                self.shape
            )));
        }
        let q = self.quantile(p)?;
        Ok((q + self.scale - self.shape * self.threshold) / (1.0 - self.shape))
    }

    /// Probability that a residual exceeds `z`, for `z >= u`.
    pub fn exceedance_probability(&self, z: f64) -> f64 {
        let rate = self.num_exceedances as f64 / self.num_obs as f64;
        let y = (z - self.threshold).max(0.0);
        rate * gpd_survival(self.shape, self.scale, y)
    }
}

fn gpd_survival(shape: f64, scale: f64, y: f64) -> f64 {
    if shape.abs() < SHAPE_ZERO {
        (-y / scale).exp()
    } else {
        let t = 1.0 + shape * y / scale;
        if t <= 0.0 {
            0.0
        } else {
            t.powf(-1.0 / shape)
        }
    }
}

/// GPD negative log-likelihood of exceedances `y`.
fn negative_log_likelihood(shape: f64, scale: f64, y: &[f64]) -> f64 {
    if scale <= 0.0 {
        return f64::INFINITY;
    }
    let n = y.len() as f64;
    if shape.abs() < SHAPE_ZERO {
        return n * scale.ln() + y.iter().sum::<f64>() / scale;
    }
    let mut sum = 0.0;
    for &yi in y {
        let t = 1.0 + shape * yi / scale;
        if t <= 0.0 {
            return f64::INFINITY;
        }
        sum += t.ln();
    }
    n * scale.ln() + (1.0 + 1.0 / shape) * sum
}

/// Fits a [`TailModel`] by maximum likelihood.
#[derive(Debug, Clone)]
pub struct TailEstimator<O = NelderMead> {
    optimizer: O,
    config: OptimizationConfig,
    tail_fraction: f64,
    min_exceedances: usize,
}

impl Default for TailEstimator<NelderMead> {
    fn default() -> Self {
        Self::with_optimizer(NelderMead::default())
    }
}

impl TailEstimator<NelderMead> {
    /// Creates an estimator with the default fraction and minimum.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: Optimizer> TailEstimator<O> {
    /// Creates an estimator with a specific optimizer.
    pub fn with_optimizer(optimizer: O) -> Self {
        Self {
            optimizer,
            config: OptimizationConfig::default()
                .with_tolerance(1e-10)
                .with_max_iterations(5_000),
            tail_fraction: DEFAULT_TAIL_FRACTION,
            min_exceedances: DEFAULT_MIN_EXCEEDANCES,
        }
    }

    /// Sets the share of residuals above the threshold.
    #[must_use]
    pub fn with_tail_fraction(mut self, fraction: f64) -> Self {
        self.tail_fraction = fraction;
        self
    }

    /// Sets the minimum number of exceedances.
    #[must_use]
    pub fn with_min_exceedances(mut self, min: usize) -> Self {
        self.min_exceedances = min;
        self
    }

    /// Replaces the optimizer settings.
    #[must_use]
    pub fn with_config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    /// Share of residuals above the threshold.
    pub fn tail_fraction(&self) -> f64 {
        self.tail_fraction
    }

    /// Fits the upper tail of `residuals`.
    ///
    /// # Errors
    ///
    /// - [`RiskError::InvalidInput`] for a fraction outside `(0, 1)` or
    ///   non-finite residuals
    /// - [`RiskError::InsufficientTailData`] when fewer than the minimum
    ///   residuals exceed the threshold
    /// - [`RiskError::Math`] when the likelihood cannot be maximized
    pub fn fit(&self, residuals: &[f64]) -> RiskResult<TailModel> {
        if !(self.tail_fraction > 0.0 && self.tail_fraction < 1.0) {
            return Err(RiskError::invalid_input(format!(
                "tail fraction must lie in (0, 1), got {}",
                self.tail_fraction
            )));
        }
        if residuals.iter().any(|z| !z.is_finite()) {
            return Err(RiskError::invalid_input("residuals must be finite"));
        }

        let threshold = stats::quantile(residuals, 1.0 - self.tail_fraction)?;
        let exceedances: Vec<f64> = residuals
            .iter()
            .filter(|&&z| z > threshold)
            .map(|z| z - threshold)
            .collect();

        let required = self.min_exceedances.max(3);
        if exceedances.len() < required {
            return Err(RiskError::InsufficientTailData {
                required,
                actual: exceedances.len(),
            });
        }

        let (shape0, scale0) = moment_start(&exceedances)?;
        let largest = exceedances.iter().copied().fold(0.0, f64::max);
        let bounds = Bounds::new(
            vec![SHAPE_MIN, scale0 * 1e-4],
            vec![SHAPE_MAX, (largest * 10.0).max(scale0 * 10.0)],
        )?;

        let objective = |x: &[f64]| negative_log_likelihood(x[0], x[1], &exceedances);
        let result = self
            .optimizer
            .minimize(objective, &[shape0, scale0], &bounds, &self.config)?;
        if !result.converged || !result.objective_value.is_finite() {
            return Err(MathError::convergence_failed(
                result.iterations,
                result.objective_value,
            )
            .into());
        }

        let model = TailModel {
            shape: result.parameters[0],
            scale: result.parameters[1],
            threshold,
            num_obs: residuals.len(),
            num_exceedances: exceedances.len(),
            log_likelihood: -result.objective_value,
        };
        debug!(
            threshold = model.threshold,
            exceedances = model.num_exceedances,
            shape = model.shape,
            scale = model.scale,
            "GPD tail fitted"
        );
        Ok(model)
    }
}

/// Method-of-moments start, clamped inside the search box.
fn moment_start(y: &[f64]) -> RiskResult<(f64, f64)> {
    let m = stats::mean(y);
    let v = stats::variance(y)?;
    if !(m > 0.0 && v > 0.0) {
        return Err(RiskError::invalid_input("degenerate exceedances"));
    }
    let r = m * m / v;
    let shape = (0.5 * (1.0 - r)).clamp(SHAPE_MIN + 0.05, SHAPE_MAX - 0.09);
    let scale = (0.5 * m * (r + 1.0)).max(1e-8);
    Ok((shape, scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gpd_quantile(shape: f64, scale: f64, p: f64) -> f64 {
        scale / shape * ((1.0 - p).powf(-shape) - 1.0)
    }

    /// A flat body below 1.5 and an exact GPD(0.2, 1) tail above it.
    fn pareto_tailed_sample() -> Vec<f64> {
        let body = 18_000;
        let tail = 2_000;
        let mut z: Vec<f64> = (0..body)
            .map(|i| -2.0 + 3.5 * i as f64 / body as f64)
            .collect();
        z.extend(
            (1..=tail).map(|i| 1.5 + gpd_quantile(0.2, 1.0, (i as f64 - 0.5) / tail as f64)),
        );
        z
    }

    #[test]
    fn test_recovers_analytic_pareto_tail() {
        let model = TailEstimator::new().fit(&pareto_tailed_sample()).unwrap();
        assert_eq!(model.num_exceedances, 2_000);
        assert_eq!(model.num_obs, 20_000);
        assert_relative_eq!(model.threshold, 1.5, epsilon = 1e-3);
        assert!((model.shape - 0.2).abs() < 0.05, "shape {}", model.shape);
        assert!((model.scale - 1.0).abs() < 0.1, "scale {}", model.scale);
    }

    #[test]
    fn test_quantile_and_shortfall() {
        let model = TailModel {
            shape: 0.2,
            scale: 0.5,
            threshold: 1.2,
            num_obs: 1000,
            num_exceedances: 100,
            log_likelihood: 0.0,
        };
        // At the edge of the tail the quantile is the threshold
        assert_relative_eq!(model.quantile(0.9).unwrap(), 1.2, epsilon = 1e-12);

        let q = model.quantile(0.99).unwrap();
        let expected = 1.2 + 0.5 / 0.2 * (0.1f64.powf(-0.2) - 1.0);
        assert_relative_eq!(q, expected, epsilon = 1e-12);
        assert_relative_eq!(model.exceedance_probability(q), 0.01, epsilon = 1e-12);

        let es = model.expected_shortfall(0.99).unwrap();
        assert_relative_eq!(es, (q + 0.5 - 0.2 * 1.2) / 0.8, epsilon = 1e-12);
        assert!(es > q);

        assert!(model.quantile(0.5).is_err());
        assert!(model.quantile(1.0).is_err());
    }

    #[test]
    fn test_exponential_limit() {
        let model = TailModel {
            shape: 0.0,
            scale: 1.0,
            threshold: 2.0,
            num_obs: 500,
            num_exceedances: 50,
            log_likelihood: 0.0,
        };
        assert_relative_eq!(model.quantile(0.99).unwrap(), 2.0 + 10f64.ln(), epsilon = 1e-12);
        // Memoryless: ES exceeds VaR by the scale
        assert_relative_eq!(
            model.expected_shortfall(0.99).unwrap() - model.quantile(0.99).unwrap(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_insufficient_tail() {
        let z: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        match TailEstimator::new().fit(&z) {
            Err(RiskError::InsufficientTailData { required, actual }) => {
                assert_eq!(required, 20);
                assert_eq!(actual, 10);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(TailEstimator::new().with_min_exceedances(10).fit(&z).is_ok());
    }

    #[test]
    fn test_rejects_bad_input() {
        let z = vec![0.0, f64::NAN, 1.0];
        assert!(matches!(
            TailEstimator::new().fit(&z),
            Err(RiskError::InvalidInput(_))
        ));
        assert!(TailEstimator::new()
            .with_tail_fraction(1.0)
            .fit(&[1.0, 2.0])
            .is_err());
    }

    #[test]
    fn test_likelihood_continuity_at_zero_shape() {
        let y = [0.1, 0.5, 1.3, 2.2, 0.05];
        let at_zero = negative_log_likelihood(0.0, 0.8, &y);
        let near_zero = negative_log_likelihood(1e-7, 0.8, &y);
        assert_relative_eq!(at_zero, near_zero, epsilon = 1e-5);
        assert!(negative_log_likelihood(-0.5, 0.8, &[2.0]).is_infinite());
    }
}
