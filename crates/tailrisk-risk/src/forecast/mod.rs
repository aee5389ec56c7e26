//! Conditional VaR and expected shortfall forecasts.
//!
//! The forecaster works on the **loss** series, so the upper tail of the
//! standardized residuals is the loss tail. For a fitted model and its GPD
//! tail, the `h`-step forecast is
//!
//! ```text
//! VaR_h = mu_{t+h} + sigma_{t+h} * q_{1-alpha}
//! ES_h  = mu_{t+h} + sigma_{t+h} * ES_{1-alpha}
//! ```
//!
//! with `q` and `ES` taken from the [`TailModel`], `mu` from the ARMA
//! recursion with future shocks set to zero and `sigma^2` from the GARCH
//! recursion with future squared shocks replaced by their expectation.

mod rolling;

pub use rolling::{RollingBacktest, RollingForecast, RollingForecaster};

use serde::{Deserialize, Serialize};
use tailrisk_core::ModelSpec;
use tailrisk_models::{FittedModel, GarchParameters, InnovationDistribution};
use tracing::debug;

use crate::error::{RiskError, RiskResult};
use crate::evt::TailModel;

/// Default VaR significance level.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.01;

/// Forecast for one step ahead of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarForecast {
    /// Steps ahead, starting at 1.
    pub horizon: usize,
    /// Conditional mean of the loss.
    pub mean: f64,
    /// Conditional standard deviation of the loss.
    pub volatility: f64,
    /// GARCH-EVT value at risk.
    pub var: f64,
    /// GARCH-EVT expected shortfall.
    pub es: f64,
    /// VaR from the fitted innovation law alone.
    pub parametric_var: f64,
    /// ES from the fitted innovation law alone.
    pub parametric_es: f64,
}

/// Forecasts for steps `1..=horizon` from one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPath {
    /// Model used.
    pub spec: ModelSpec,
    /// Significance level `alpha`.
    pub significance: f64,
    /// Observations behind the forecast; step 1 targets this index.
    pub origin: usize,
    /// One entry per step.
    pub steps: Vec<VarForecast>,
}

impl ForecastPath {
    /// The one-step forecast.
    pub fn next(&self) -> Option<&VarForecast> {
        self.steps.first()
    }
}

/// Produces [`ForecastPath`]s from a fitted model and its tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarForecaster {
    significance: f64,
    horizon: usize,
}

impl Default for VarForecaster {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
            horizon: 1,
        }
    }
}

impl VarForecaster {
    /// Creates a forecaster for `significance` and `horizon` steps.
    pub fn new(significance: f64, horizon: usize) -> RiskResult<Self> {
        if !(significance > 0.0 && significance < 1.0) {
            return Err(RiskError::invalid_input(format!(
                "significance must lie in (0, 1), got {significance}"
            )));
        }
        if horizon == 0 {
            return Err(RiskError::invalid_input("horizon must be at least 1"));
        }
        Ok(Self {
            significance,
            horizon,
        })
    }

    /// Significance level.
    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// Number of steps.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forecasts from the end of the sample `model` was fitted to.
    ///
    /// # Errors
    ///
    /// Fails with [`RiskError::NonStationaryModel`] when the variance
    /// forecast does not mean-revert, and when the significance level lies
    /// outside the modelled tail.
    pub fn forecast(&self, model: &FittedModel, tail: &TailModel) -> RiskResult<ForecastPath> {
        check_stationary(model)?;

        let level = 1.0 - self.significance;
        let tail_quantile = tail.quantile(level)?;
        let tail_shortfall = tail.expected_shortfall(level)?;
        let innovation = model.innovation()?;
        let normal_quantile = innovation.quantile(level)?;
        let normal_shortfall = innovation.tail_expectation(level)?;

        let mut state = RecursionState::from_model(model);
        let mut steps = Vec::with_capacity(self.horizon);
        for horizon in 1..=self.horizon {
            let mean = state.next_mean();
            let variance = state.next_variance();
            // Expected shock is zero, expected squared shock is the variance
            state.push(mean, 0.0, variance, variance);

            let volatility = variance.sqrt();
            steps.push(VarForecast {
                horizon,
                mean,
                volatility,
                var: mean + volatility * tail_quantile,
                es: mean + volatility * tail_shortfall,
                parametric_var: mean + volatility * normal_quantile,
                parametric_es: mean + volatility * normal_shortfall,
            });
        }

        debug!(
            spec = %model.spec(),
            origin = model.num_obs(),
            var = steps[0].var,
            "VaR forecast"
        );
        Ok(ForecastPath {
            spec: *model.spec(),
            significance: self.significance,
            origin: model.num_obs(),
            steps,
        })
    }
}

pub(crate) fn check_stationary(model: &FittedModel) -> RiskResult<()> {
    let persistence = model.persistence();
    if persistence < 1.0 {
        Ok(())
    } else {
        Err(RiskError::NonStationaryModel {
            spec: *model.spec(),
            persistence,
        })
    }
}

/// The trailing history needed to run the ARMA-GARCH recursion forward.
///
/// Holds the last `max(p, q, r, s)` observations, shocks, squared shocks
/// and variances. Simulation pushes realized values; analytic forecasts
/// push expectations.
#[derive(Debug, Clone)]
pub(crate) struct RecursionState<'a> {
    params: &'a GarchParameters,
    lags: usize,
    x: Vec<f64>,
    shocks: Vec<f64>,
    squared_shocks: Vec<f64>,
    variances: Vec<f64>,
}

impl<'a> RecursionState<'a> {
    pub(crate) fn from_model(model: &'a FittedModel) -> Self {
        let spec = model.spec();
        let lags = spec
            .arma_p
            .max(spec.arma_q)
            .max(spec.garch_r)
            .max(spec.garch_s)
            .max(1);
        let tail = |v: &[f64]| v[v.len().saturating_sub(lags)..].to_vec();
        let shocks = tail(model.residuals());
        Self {
            params: model.params(),
            lags,
            x: tail(model.series()),
            squared_shocks: shocks.iter().map(|a| a * a).collect(),
            shocks,
            variances: tail(model.conditional_variance()),
        }
    }

    fn lag(values: &[f64], k: usize) -> Option<f64> {
        values.len().checked_sub(k).map(|i| values[i])
    }

    pub(crate) fn next_mean(&self) -> f64 {
        let p = self.params;
        let mut m = p.mu;
        for (i, phi) in p.ar.iter().enumerate() {
            if let Some(x) = Self::lag(&self.x, i + 1) {
                m += phi * (x - p.mu);
            }
        }
        for (j, theta) in p.ma.iter().enumerate() {
            if let Some(a) = Self::lag(&self.shocks, j + 1) {
                m += theta * a;
            }
        }
        m
    }

    pub(crate) fn next_variance(&self) -> f64 {
        let p = self.params;
        let mut h = p.omega;
        for (i, alpha) in p.alpha.iter().enumerate() {
            if let Some(a2) = Self::lag(&self.squared_shocks, i + 1) {
                h += alpha * a2;
            }
        }
        for (j, beta) in p.beta.iter().enumerate() {
            if let Some(v) = Self::lag(&self.variances, j + 1) {
                h += beta * v;
            }
        }
        h
    }

    pub(crate) fn push(&mut self, x: f64, shock: f64, squared_shock: f64, variance: f64) {
        let lags = self.lags;
        for (values, value) in [
            (&mut self.x, x),
            (&mut self.shocks, shock),
            (&mut self.squared_shocks, squared_shock),
            (&mut self.variances, variance),
        ] {
            values.push(value);
            if values.len() > lags {
                values.remove(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tailrisk_core::DistributionFamily;
    use tailrisk_models::filter;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                (0.7 * t).sin() * (1.0 + 0.5 * (0.05 * t).cos()) + 0.3 * (1.3 * t).cos()
            })
            .collect()
    }

    fn tail() -> TailModel {
        TailModel {
            shape: 0.1,
            scale: 0.6,
            threshold: 1.3,
            num_obs: 400,
            num_exceedances: 40,
            log_likelihood: 0.0,
        }
    }

    fn garch11(data: &[f64], omega: f64, alpha: f64, beta: f64) -> FittedModel {
        let spec = ModelSpec::new(0, 0, 1, 1, DistributionFamily::Normal);
        let params = GarchParameters::from_vector(&spec, &[0.05, omega, alpha, beta]).unwrap();
        filter(&spec, &params, data).unwrap()
    }

    #[test]
    fn test_garch11_closed_form() {
        let data = wavy(400);
        let (omega, alpha, beta) = (0.05, 0.1, 0.85);
        let model = garch11(&data, omega, alpha, beta);
        let path = VarForecaster::new(0.01, 10)
            .unwrap()
            .forecast(&model, &tail())
            .unwrap();

        let n = data.len();
        let a = model.residuals()[n - 1];
        let h = model.conditional_variance()[n - 1];
        let one_step = omega + alpha * a * a + beta * h;

        // kappa * theta = omega, 1 - kappa = alpha + beta
        let kappa = 1.0 - alpha - beta;
        let theta = omega / kappa;
        let lambda = beta / (alpha + beta);
        let textbook = kappa * theta + (1.0 - kappa) * ((1.0 - lambda) * a * a + lambda * h);
        assert_relative_eq!(one_step, textbook, epsilon = 1e-12);

        for step in &path.steps {
            let k = step.horizon as i32;
            let expected = kappa * theta * (0..k - 1).map(|j| (1.0 - kappa).powi(j)).sum::<f64>()
                + (1.0 - kappa).powi(k - 1) * one_step;
            assert_relative_eq!(step.volatility.powi(2), expected, epsilon = 1e-12);
            assert_relative_eq!(step.mean, 0.05, epsilon = 1e-12);
        }
        // Mean-reverts towards the unconditional variance
        let last = path.steps[9].volatility.powi(2);
        assert!((last - theta).abs() < (one_step - theta).abs());
    }

    #[test]
    fn test_var_uses_tail_quantile() {
        let model = garch11(&wavy(300), 0.05, 0.1, 0.85);
        let tail = tail();
        let step = VarForecaster::new(0.01, 1)
            .unwrap()
            .forecast(&model, &tail)
            .unwrap()
            .steps[0];
        let q = tail.quantile(0.99).unwrap();
        assert_relative_eq!(step.var, step.mean + step.volatility * q, epsilon = 1e-12);
        assert!(step.es > step.var);
        assert!(step.parametric_es > step.parametric_var);
        // Normal 99% quantile
        assert_relative_eq!(
            (step.parametric_var - step.mean) / step.volatility,
            2.326_347_874_040_841,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_arma_mean_path_decays() {
        let spec = ModelSpec::new(1, 0, 1, 0, DistributionFamily::Normal);
        let params = GarchParameters::from_vector(&spec, &[0.0, 0.5, 0.5, 0.2]).unwrap();
        let mut data = wavy(200);
        data[199] = 4.0;
        let model = filter(&spec, &params, &data).unwrap();
        let path = VarForecaster::new(0.01, 3)
            .unwrap()
            .forecast(&model, &tail())
            .unwrap();
        assert_relative_eq!(path.steps[0].mean, 2.0, epsilon = 1e-12);
        assert_relative_eq!(path.steps[1].mean, 1.0, epsilon = 1e-12);
        assert_relative_eq!(path.steps[2].mean, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_non_stationary_rejected() {
        let model = garch11(&wavy(300), 0.05, 0.2, 0.85);
        match VarForecaster::default().forecast(&model, &tail()) {
            Err(RiskError::NonStationaryModel { persistence, .. }) => {
                assert_relative_eq!(persistence, 1.05, epsilon = 1e-12);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_level_outside_tail() {
        let model = garch11(&wavy(300), 0.05, 0.1, 0.85);
        let forecaster = VarForecaster::new(0.2, 1).unwrap();
        assert!(matches!(
            forecaster.forecast(&model, &tail()),
            Err(RiskError::InvalidInput(_))
        ));
        assert!(VarForecaster::new(0.0, 1).is_err());
        assert!(VarForecaster::new(0.01, 0).is_err());
    }
}
