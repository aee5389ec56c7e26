//! Fitted model value object.

use serde::{Deserialize, Serialize};
use tailrisk_core::ModelSpec;

use super::params::GarchParameters;
use crate::criteria::InformationCriteria;
use crate::distributions::Innovation;
use crate::error::ModelResult;

/// One row of a parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    /// Parameter name (`mu`, `ar1`, `omega`, `alpha1`, ...).
    pub name: String,
    /// Point estimate.
    pub value: f64,
    /// Asymptotic standard error, when the Hessian was invertible.
    pub std_error: Option<f64>,
    /// `value / std_error`.
    pub t_value: Option<f64>,
}

/// An estimated (or filtered) ARMA-GARCH model together with its in-sample
/// paths. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct FittedModel {
    spec: ModelSpec,
    params: GarchParameters,
    log_likelihood: f64,
    iterations: u32,
    series: Vec<f64>,
    conditional_mean: Vec<f64>,
    residuals: Vec<f64>,
    conditional_variance: Vec<f64>,
    standardized_residuals: Vec<f64>,
    std_errors: Option<Vec<Option<f64>>>,
}

impl FittedModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        spec: ModelSpec,
        params: GarchParameters,
        log_likelihood: f64,
        iterations: u32,
        series: Vec<f64>,
        conditional_mean: Vec<f64>,
        residuals: Vec<f64>,
        conditional_variance: Vec<f64>,
    ) -> Self {
        let standardized_residuals = residuals
            .iter()
            .zip(&conditional_variance)
            .map(|(a, h)| a / h.sqrt())
            .collect();
        Self {
            spec,
            params,
            log_likelihood,
            iterations,
            series,
            conditional_mean,
            residuals,
            conditional_variance,
            standardized_residuals,
            std_errors: None,
        }
    }

    pub(crate) fn with_std_errors(mut self, std_errors: Option<Vec<Option<f64>>>) -> Self {
        self.std_errors = std_errors;
        self
    }

    /// The fitted specification.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Estimated parameters.
    pub fn params(&self) -> &GarchParameters {
        &self.params
    }

    /// Maximized log-likelihood.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Optimizer iterations (zero for a filtered model).
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of observations.
    pub fn num_obs(&self) -> usize {
        self.series.len()
    }

    /// The series the model was fitted to.
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Conditional means `E[x_t | F_{t-1}]`.
    pub fn conditional_mean(&self) -> &[f64] {
        &self.conditional_mean
    }

    /// Residuals `a_t`.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Conditional variances `sigma_t^2`.
    pub fn conditional_variance(&self) -> &[f64] {
        &self.conditional_variance
    }

    /// Conditional standard deviations `sigma_t`.
    pub fn conditional_sd(&self) -> Vec<f64> {
        self.conditional_variance.iter().map(|h| h.sqrt()).collect()
    }

    /// Standardized residuals `a_t / sigma_t`.
    pub fn standardized_residuals(&self) -> &[f64] {
        &self.standardized_residuals
    }

    /// Standard errors in parameter-vector order, if computed.
    pub fn std_errors(&self) -> Option<&[Option<f64>]> {
        self.std_errors.as_deref()
    }

    /// `sum(alpha) + sum(beta)`.
    pub fn persistence(&self) -> f64 {
        self.params.persistence()
    }

    /// Whether the variance process is covariance stationary.
    pub fn is_stationary(&self) -> bool {
        self.params.is_stationary()
    }

    /// The fitted innovation distribution.
    pub fn innovation(&self) -> ModelResult<Innovation> {
        self.params.innovation(self.spec.family)
    }

    /// Information criteria for this fit.
    pub fn criteria(&self) -> ModelResult<InformationCriteria> {
        InformationCriteria::new(self.log_likelihood, self.spec.num_params(), self.num_obs())
    }

    /// Parameter table with standard errors and t-values.
    pub fn parameter_table(&self) -> Vec<ParameterEstimate> {
        let names = GarchParameters::names(&self.spec);
        let values = self.params.to_vector(&self.spec);
        names
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(i, (name, value))| {
                let std_error = self
                    .std_errors
                    .as_ref()
                    .and_then(|se| se.get(i).copied().flatten());
                ParameterEstimate {
                    name,
                    value,
                    std_error,
                    t_value: std_error.map(|se| value / se),
                }
            })
            .collect()
    }

    /// A serializable digest of the fit.
    pub fn summary(&self) -> ModelResult<FitSummary> {
        Ok(FitSummary {
            spec: self.spec,
            log_likelihood: self.log_likelihood,
            num_obs: self.num_obs(),
            iterations: self.iterations,
            persistence: self.persistence(),
            stationary: self.is_stationary(),
            criteria: self.criteria()?,
            parameters: self.parameter_table(),
        })
    }
}

/// Serializable digest of a [`FittedModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Fitted specification.
    pub spec: ModelSpec,
    /// Maximized log-likelihood.
    pub log_likelihood: f64,
    /// Observations used.
    pub num_obs: usize,
    /// Optimizer iterations.
    pub iterations: u32,
    /// `sum(alpha) + sum(beta)`.
    pub persistence: f64,
    /// Whether persistence is below one.
    pub stationary: bool,
    /// Information criteria.
    pub criteria: InformationCriteria,
    /// Parameter table.
    pub parameters: Vec<ParameterEstimate>,
}
