//! Out-of-sample one-step forecasts over a trailing window.

use serde::{Deserialize, Serialize};
use tailrisk_config::WindowKind;
use tailrisk_core::ModelSpec;
use tailrisk_math::optimization::{NelderMead, Optimizer};
use tailrisk_models::{filter, FittedModel, GarchEstimator, GarchParameters, ModelError};
use tracing::{debug, info, warn};

use super::VarForecaster;
use crate::error::{RiskError, RiskResult};
use crate::evt::{TailEstimator, TailModel};
use crate::forecast::VarForecast;

/// Default share of the sample held out.
pub const DEFAULT_OUT_OF_SAMPLE_FRACTION: f64 = 0.1;

/// Default days between re-estimations.
pub const DEFAULT_REFIT_EVERY: usize = 25;

/// One out-of-sample forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingForecast {
    /// Index of the forecast day in the full series.
    pub target: usize,
    /// First index of the estimation window; the window ends at `target`.
    pub window_start: usize,
    /// Realized loss on the target day.
    pub realized: f64,
    /// One-step forecast.
    pub forecast: VarForecast,
    /// Whether parameters were re-estimated for this day.
    pub refitted: bool,
}

/// All out-of-sample forecasts of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingBacktest {
    /// Model re-estimated along the way.
    pub spec: ModelSpec,
    /// Window kind used.
    pub window: WindowKind,
    /// Forecasts in target order.
    pub forecasts: Vec<RollingForecast>,
}

impl RollingBacktest {
    /// Number of re-estimations.
    pub fn refits(&self) -> usize {
        self.forecasts.iter().filter(|f| f.refitted).count()
    }

    /// Realized losses in target order.
    pub fn realized(&self) -> Vec<f64> {
        self.forecasts.iter().map(|f| f.realized).collect()
    }

    /// VaR forecasts in target order.
    pub fn var(&self) -> Vec<f64> {
        self.forecasts.iter().map(|f| f.forecast.var).collect()
    }
}

/// Re-estimates a fixed specification through the out-of-sample window.
///
/// For every target day `t` in `[N - m, N)` the model sees only indices
/// below `t`. Parameters are re-estimated on the first target and every
/// `refit_every` days after it, warm-started from the previous estimate;
/// between refits the last parameters are re-filtered over the new window.
/// The tail model is refitted with every re-estimation.
#[derive(Debug, Clone)]
pub struct RollingForecaster<O = NelderMead> {
    estimator: GarchEstimator<O>,
    tail: TailEstimator,
    forecaster: VarForecaster,
    out_of_sample_fraction: f64,
    refit_every: usize,
    window: WindowKind,
}

impl Default for RollingForecaster<NelderMead> {
    fn default() -> Self {
        Self::new(
            GarchEstimator::new().with_std_errors(false),
            TailEstimator::new(),
            VarForecaster::default(),
        )
    }
}

impl<O: Optimizer> RollingForecaster<O> {
    /// Creates a rolling forecaster from its parts. The forecaster's
    /// horizon is ignored; rolling forecasts are one step ahead.
    pub fn new(estimator: GarchEstimator<O>, tail: TailEstimator, forecaster: VarForecaster) -> Self {
        Self {
            estimator,
            tail,
            forecaster,
            out_of_sample_fraction: DEFAULT_OUT_OF_SAMPLE_FRACTION,
            refit_every: DEFAULT_REFIT_EVERY,
            window: WindowKind::Moving,
        }
    }

    /// Sets the share of the sample held out.
    #[must_use]
    pub fn with_out_of_sample_fraction(mut self, fraction: f64) -> Self {
        self.out_of_sample_fraction = fraction;
        self
    }

    /// Sets the days between re-estimations.
    #[must_use]
    pub fn with_refit_every(mut self, days: usize) -> Self {
        self.refit_every = days;
        self
    }

    /// Sets the estimation window kind.
    #[must_use]
    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    /// Number of out-of-sample days for a series of `n` observations.
    pub fn out_of_sample_len(&self, n: usize) -> usize {
        (n as f64 * self.out_of_sample_fraction).round() as usize
    }

    /// Runs the out-of-sample loop over `losses`.
    ///
    /// # Errors
    ///
    /// Fails when the out-of-sample window is empty or covers the whole
    /// sample, when a re-estimation fails with no earlier parameters to fall
    /// back to, and on any tail or forecast error.
    pub fn run(
        &self,
        spec: &ModelSpec,
        losses: &[f64],
    ) -> RiskResult<RollingBacktest> {
        let n = losses.len();
        let m = self.out_of_sample_len(n);
        if m == 0 || m >= n {
            return Err(RiskError::invalid_input(format!(
                "out-of-sample window of {m} days does not fit {n} observations"
            )));
        }
        if self.refit_every == 0 {
            return Err(RiskError::invalid_input("refit interval must be at least 1"));
        }
        let first = n - m;
        info!(%spec, targets = m, window = %self.window, "rolling forecasts");

        let forecaster = VarForecaster::new(self.forecaster.significance(), 1)?;
        let mut params: Option<GarchParameters> = None;
        let mut tail: Option<TailModel> = None;
        let mut forecasts = Vec::with_capacity(m);

        for target in first..n {
            let window_start = match self.window {
                WindowKind::Moving => target - first,
                WindowKind::Expanding => 0,
            };
            let window = &losses[window_start..target];
            let due = (target - first) % self.refit_every == 0;

            let (model, refitted) = match (&params, &tail) {
                (Some(last), Some(_)) if !due => (filter(spec, last, window)?, false),
                _ => self.refit(spec, params.as_ref(), window, target)?,
            };
            if refitted || tail.is_none() {
                tail = Some(self.tail.fit(model.standardized_residuals())?);
            }
            params = Some(model.params().clone());

            let tail_model = tail.as_ref().ok_or_else(|| {
                RiskError::invalid_input("tail model missing after refit")
            })?;
            let path = forecaster.forecast(&model, tail_model)?;
            let forecast = path.steps[0];

            forecasts.push(RollingForecast {
                target,
                window_start,
                realized: losses[target],
                forecast,
                refitted,
            });
        }

        let result = RollingBacktest {
            spec: *spec,
            window: self.window,
            forecasts,
        };
        debug!(refits = result.refits(), "rolling forecasts complete");
        Ok(result)
    }

    /// Re-estimates on `window`, falling back to the previous parameters
    /// when the fit fails to converge or leaves the stationary region.
    fn refit(
        &self,
        spec: &ModelSpec,
        previous: Option<&GarchParameters>,
        window: &[f64],
        target: usize,
    ) -> RiskResult<(FittedModel, bool)> {
        let outcome = match previous {
            Some(last) => match self.estimator.fit_from(spec, window, last) {
                Err(e) if e.is_non_convergence() => {
                    debug!(target, "warm start failed, refitting from default start");
                    self.estimator.fit(spec, window)
                }
                other => other,
            },
            None => self.estimator.fit(spec, window),
        };

        match (outcome, previous) {
            (Ok(model), _) if model.is_stationary() => {
                debug!(target, persistence = model.persistence(), "refitted");
                Ok((model, true))
            }
            (Ok(model), Some(last)) if last.is_stationary() => {
                warn!(
                    target,
                    persistence = model.persistence(),
                    "non-stationary refit, keeping previous parameters"
                );
                Ok((filter(spec, last, window)?, false))
            }
            (Ok(model), _) => Ok((model, true)),
            (Err(e @ ModelError::NonConvergence { .. }), Some(last)) => {
                warn!(target, error = %e, "refit failed, keeping previous parameters");
                Ok((filter(spec, last, window)?, false))
            }
            (Err(e), _) => Err(e.into()),
        }
    }
}
