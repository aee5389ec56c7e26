//! Maximum-likelihood estimation.

use tailrisk_core::ModelSpec;
use tailrisk_math::linear_algebra::invert;
use tailrisk_math::optimization::{
    numerical_hessian, NelderMead, OptimizationConfig, Optimizer,
};
use tailrisk_math::{stats, MathError};
use tracing::{debug, warn};

use super::model::FittedModel;
use super::params::GarchParameters;
use super::recursion;
use crate::error::{ModelError, ModelResult};

/// Observations required beyond the parameter count.
pub const MIN_EXCESS_OBSERVATIONS: usize = 10;

const HESSIAN_STEP: f64 = 1e-4;

/// Fits ARMA-GARCH specifications by maximizing the exact conditional
/// log-likelihood.
///
/// Generic over the [`Optimizer`]; [`NelderMead`] is the default.
#[derive(Debug, Clone)]
pub struct GarchEstimator<O = NelderMead> {
    optimizer: O,
    config: OptimizationConfig,
    std_errors: bool,
}

impl Default for GarchEstimator<NelderMead> {
    fn default() -> Self {
        Self::with_optimizer(NelderMead::default())
    }
}

impl GarchEstimator<NelderMead> {
    /// Creates an estimator using Nelder-Mead.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Optimizer settings suited to likelihoods of a few thousand observations.
pub fn default_optimization_config() -> OptimizationConfig {
    OptimizationConfig {
        tolerance: 1e-9,
        parameter_tolerance: 1e-6,
        max_iterations: 20_000,
    }
}

impl<O: Optimizer> GarchEstimator<O> {
    /// Creates an estimator with a specific optimizer.
    pub fn with_optimizer(optimizer: O) -> Self {
        Self {
            optimizer,
            config: default_optimization_config(),
            std_errors: true,
        }
    }

    /// Sets the optimizer configuration.
    #[must_use]
    pub fn with_config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables Hessian standard errors.
    #[must_use]
    pub fn with_std_errors(mut self, enabled: bool) -> Self {
        self.std_errors = enabled;
        self
    }

    /// Optimizer configuration in use.
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Fits `spec` to `data` from the default starting point.
    pub fn fit(&self, spec: &ModelSpec, data: &[f64]) -> ModelResult<FittedModel> {
        let (mean, variance) = check_series(spec, data)?;
        let start = GarchParameters::initial(spec, mean, variance);
        self.estimate(spec, data, mean, variance, &start)
    }

    /// Fits `spec` to `data` starting from `start`, typically the previous
    /// estimate on an overlapping window.
    pub fn fit_from(
        &self,
        spec: &ModelSpec,
        data: &[f64],
        start: &GarchParameters,
    ) -> ModelResult<FittedModel> {
        start.check_matches(spec)?;
        let (mean, variance) = check_series(spec, data)?;
        self.estimate(spec, data, mean, variance, start)
    }

    fn estimate(
        &self,
        spec: &ModelSpec,
        data: &[f64],
        mean: f64,
        variance: f64,
        start: &GarchParameters,
    ) -> ModelResult<FittedModel> {
        let bounds = GarchParameters::bounds(spec, mean, variance)?;
        let objective = |x: &[f64]| negative_log_likelihood(spec, x, data, variance);

        let result = match self.optimizer.minimize(
            objective,
            &start.to_vector(spec),
            &bounds,
            &self.config,
        ) {
            Ok(result) => result,
            Err(MathError::NonFiniteObjective) => {
                return Err(ModelError::NonConvergence {
                    spec: *spec,
                    iterations: 0,
                    reason: "likelihood not finite at the starting point".to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !result.converged || !result.objective_value.is_finite() {
            let reason = if result.converged {
                "non-finite likelihood".to_string()
            } else {
                format!("{} exhausted its iteration budget", self.optimizer.name())
            };
            warn!(%spec, iterations = result.iterations, %reason, "fit did not converge");
            return Err(ModelError::NonConvergence {
                spec: *spec,
                iterations: result.iterations,
                reason,
            });
        }

        let params = GarchParameters::from_vector(spec, &result.parameters)?;
        let fitted = build(spec, params, data, variance, result.iterations)?;

        let std_errors = if self.std_errors {
            standard_errors(spec, &result.parameters, data, variance)
        } else {
            None
        };

        debug!(
            %spec,
            log_likelihood = fitted.log_likelihood(),
            iterations = result.iterations,
            persistence = fitted.persistence(),
            "fitted model"
        );
        if !fitted.is_stationary() {
            warn!(%spec, persistence = fitted.persistence(), "fitted model is not stationary");
        }

        Ok(fitted.with_std_errors(std_errors))
    }
}

/// Applies fixed parameters to `data` without re-estimation.
///
/// The pre-sample variance seed is the sample variance of `data`.
pub fn filter(
    spec: &ModelSpec,
    params: &GarchParameters,
    data: &[f64],
) -> ModelResult<FittedModel> {
    params.check_matches(spec)?;
    let required = spec.variance_burn_in().max(1) + 1;
    if data.len() < required {
        return Err(ModelError::InsufficientData {
            required,
            actual: data.len(),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::invalid_input("series has non-finite values"));
    }
    let variance = stats::variance(data)?;
    build(spec, params.clone(), data, variance, 0)
}

fn check_series(spec: &ModelSpec, data: &[f64]) -> ModelResult<(f64, f64)> {
    let required = spec.num_params() + MIN_EXCESS_OBSERVATIONS;
    if data.len() < required {
        return Err(ModelError::InsufficientData {
            required,
            actual: data.len(),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::invalid_input("series has non-finite values"));
    }
    let variance = stats::variance(data)?;
    if variance <= 0.0 {
        return Err(ModelError::invalid_input("series has zero variance"));
    }
    Ok((stats::mean(data), variance))
}

fn negative_log_likelihood(spec: &ModelSpec, x: &[f64], data: &[f64], seed: f64) -> f64 {
    let Ok(params) = GarchParameters::from_vector(spec, x) else {
        return f64::INFINITY;
    };
    let Ok(innovation) = params.innovation(spec.family) else {
        return f64::INFINITY;
    };
    -recursion::run(spec, &params, &innovation, data, seed).log_likelihood
}

fn build(
    spec: &ModelSpec,
    params: GarchParameters,
    data: &[f64],
    seed: f64,
    iterations: u32,
) -> ModelResult<FittedModel> {
    let innovation = params.innovation(spec.family)?;
    let pass = recursion::run(spec, &params, &innovation, data, seed);
    if !pass.log_likelihood.is_finite() {
        return Err(ModelError::invalid_input(format!(
            "{spec}: parameters give a non-finite likelihood"
        )));
    }
    Ok(FittedModel::new(
        *spec,
        params,
        pass.log_likelihood,
        iterations,
        data.to_vec(),
        pass.conditional_mean,
        pass.residuals,
        pass.conditional_variance,
    ))
}

/// Square roots of the diagonal of the inverse Hessian of the negative
/// log-likelihood. Entries are `None` where the variance is not positive.
fn standard_errors(
    spec: &ModelSpec,
    x: &[f64],
    data: &[f64],
    seed: f64,
) -> Option<Vec<Option<f64>>> {
    let hessian = numerical_hessian(
        |p| negative_log_likelihood(spec, p, data, seed),
        x,
        HESSIAN_STEP,
    );
    match invert(&hessian) {
        Ok(covariance) => Some(
            (0..x.len())
                .map(|i| {
                    let v = covariance[(i, i)];
                    (v > 0.0 && v.is_finite()).then(|| v.sqrt())
                })
                .collect(),
        ),
        Err(e) => {
            debug!(%spec, error = %e, "standard errors unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};
    use tailrisk_core::DistributionFamily;

    fn normals(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| StandardNormal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_white_noise_fit() {
        let data: Vec<f64> = normals(1500, 7).iter().map(|z| 0.3 + 1.2 * z).collect();
        let spec = ModelSpec::new(0, 0, 1, 0, DistributionFamily::Normal);
        let fit = GarchEstimator::new().fit(&spec, &data).unwrap();

        assert_relative_eq!(fit.params().mu, 0.3, epsilon = 0.1);
        assert!(fit.params().alpha[0] < 0.1);
        let long_run = fit.params().unconditional_variance().unwrap();
        assert_relative_eq!(long_run, 1.44, max_relative = 0.15);
        assert_eq!(fit.standardized_residuals().len(), data.len());
        assert!(fit.is_stationary());
    }

    #[test]
    fn test_standard_errors_and_table() {
        let data: Vec<f64> = normals(800, 11);
        let spec = ModelSpec::new(0, 0, 1, 0, DistributionFamily::Normal);
        let fit = GarchEstimator::new().fit(&spec, &data).unwrap();
        let table = fit.parameter_table();

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].name, "mu");
        // Standard error of a sample mean is about 1 / sqrt(n)
        let se_mu = table[0].std_error.unwrap();
        assert_relative_eq!(se_mu, 1.0 / 800f64.sqrt(), max_relative = 0.25);
    }

    #[test]
    fn test_insufficient_data() {
        let spec = ModelSpec::new(1, 1, 1, 1, DistributionFamily::SkewStudentT);
        let err = GarchEstimator::new().fit(&spec, &normals(12, 1)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InsufficientData {
                required: 18,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_budget_exhaustion_is_non_convergence() {
        let spec = ModelSpec::new(0, 0, 1, 1, DistributionFamily::StudentT);
        let estimator = GarchEstimator::new()
            .with_config(default_optimization_config().with_max_iterations(3));
        let err = estimator.fit(&spec, &normals(300, 3)).unwrap_err();
        assert!(err.is_non_convergence());
    }

    #[test]
    fn test_filter_reproduces_fit() {
        let data: Vec<f64> = normals(600, 5);
        let spec = ModelSpec::new(1, 0, 1, 1, DistributionFamily::Normal);
        let fit = GarchEstimator::new()
            .with_std_errors(false)
            .fit(&spec, &data)
            .unwrap();
        let filtered = filter(&spec, fit.params(), &data).unwrap();

        assert_eq!(filtered.iterations(), 0);
        assert_relative_eq!(filtered.log_likelihood(), fit.log_likelihood(), epsilon = 1e-9);
        assert_eq!(filtered.conditional_variance(), fit.conditional_variance());
    }
}
