//! End-to-end GARCH-EVT pipeline.
//!
//! ```text
//! prices -> returns -> losses -> selection -> estimation -> diagnostics
//!                                                 |
//!                                    tail (GPD) <-+-> bootstrap (FHS)
//!                                        |
//!                                    forecast    rolling forecasts -> backtest
//! ```
//!
//! Every stage is also exposed on its own so callers can stop early. Stage
//! failures come back as [`PipelineError`]s naming the stage and, where one
//! was involved, the model specification.

use serde::{Deserialize, Serialize};
use tailrisk_config::{PipelineConfig, Validate};
use tailrisk_core::{ModelSpec, PriceSeries, ReturnSeries, SeriesSummary};
use tailrisk_math::optimization::{NelderMead, OptimizationConfig};
use tailrisk_models::selection::Candidate;
use tailrisk_models::{
    FitSummary, FittedModel, GarchEstimator, ModelSelector, ModelSpace, ResidualDiagnostics,
    Selection,
};
use tracing::{info, warn};

use crate::backtest::{BacktestResult, Backtester};
use crate::bootstrap::{BootstrapForecast, FilteredHistoricalSimulation};
use crate::error::{PipelineError, RiskError, RiskResult, Stage};
use crate::evt::{TailEstimator, TailModel};
use crate::forecast::{ForecastPath, RollingBacktest, RollingForecaster, VarForecaster};

/// Everything a pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Configuration the run used.
    pub config: PipelineConfig,
    /// Summary of the return series.
    pub returns: SeriesSummary,
    /// Every candidate specification in canonical order.
    pub candidates: Vec<Candidate>,
    /// Index of the selected candidate.
    pub selected: usize,
    /// Final fit of the selected specification.
    pub fit: FitSummary,
    /// Residual diagnostics of the final fit.
    pub diagnostics: ResidualDiagnostics,
    /// GPD fitted to the standardized residuals.
    pub tail: TailModel,
    /// VaR and ES path from the end of the sample.
    pub forecast: ForecastPath,
    /// Filtered historical simulation, when enabled.
    pub bootstrap: Option<BootstrapForecast>,
    /// Out-of-sample one-step forecasts.
    pub rolling: RollingBacktest,
    /// Coverage tests of the rolling forecasts.
    pub backtest: BacktestResult,
}

impl PipelineReport {
    /// The selected specification.
    pub fn spec(&self) -> &ModelSpec {
        &self.fit.spec
    }
}

/// Runs the pipeline stages with one [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation errors.
    pub fn new(config: PipelineConfig) -> RiskResult<Self> {
        config.validate_or_error()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn estimator(&self, std_errors: bool) -> GarchEstimator<NelderMead> {
        let e = &self.config.estimation;
        let config = OptimizationConfig {
            tolerance: e.tolerance,
            parameter_tolerance: e.parameter_tolerance,
            max_iterations: e.max_iterations,
        };
        GarchEstimator::with_optimizer(NelderMead::default().with_restarts(e.restarts))
            .with_config(config)
            .with_std_errors(std_errors)
    }

    fn tail_estimator(&self) -> TailEstimator {
        TailEstimator::new()
            .with_tail_fraction(self.config.tail.tail_fraction)
            .with_min_exceedances(self.config.tail.min_exceedances)
    }

    /// The search space described by the selection section.
    pub fn model_space(&self) -> ModelSpace {
        let s = &self.config.selection;
        ModelSpace {
            families: s.families.clone(),
            max_p: s.max_p,
            max_q: s.max_q,
            max_r: s.max_r,
            max_s: s.max_s,
            include_mean: s.include_mean,
        }
    }

    /// Builds risk-free adjusted percentage log-returns.
    pub fn returns(&self, prices: &PriceSeries) -> Result<ReturnSeries, PipelineError> {
        ReturnSeries::from_price_series(prices, self.config.data.risk_free_rate)
            .map_err(|e| PipelineError::new(Stage::Returns, None, e))
    }

    /// Fits every candidate to `losses` and picks the best.
    pub fn select(&self, losses: &[f64]) -> Result<Selection, PipelineError> {
        ModelSelector::new(self.estimator(false))
            .require_stationary(self.config.selection.require_stationary)
            .parallel(self.config.selection.parallel)
            .select(&self.model_space(), losses)
            .map_err(|e| PipelineError::new(Stage::Selection, None, e))
    }

    /// Fits one specification from the default start.
    pub fn fit(&self, spec: &ModelSpec, losses: &[f64]) -> Result<FittedModel, PipelineError> {
        self.estimator(self.config.estimation.std_errors)
            .fit(spec, losses)
            .map_err(|e| PipelineError::new(Stage::Estimation, Some(*spec), e))
    }

    /// Final estimate of the selected specification, with standard errors
    /// when configured.
    pub fn estimate(&self, selection: &Selection, losses: &[f64]) -> Result<FittedModel, PipelineError> {
        if !self.config.estimation.std_errors {
            return Ok(selection.model.clone());
        }
        let spec = selection.spec();
        match self
            .estimator(true)
            .fit_from(spec, losses, selection.model.params())
        {
            Ok(model) => Ok(model),
            Err(e) if e.is_non_convergence() => {
                warn!(%spec, error = %e, "re-estimation failed, keeping selection fit");
                Ok(selection.model.clone())
            }
            Err(e) => Err(PipelineError::new(Stage::Estimation, Some(*spec), e)),
        }
    }

    /// Residual diagnostics of `model`.
    pub fn diagnostics(&self, model: &FittedModel) -> Result<ResidualDiagnostics, PipelineError> {
        ResidualDiagnostics::for_model(model, self.config.diagnostics.lags)
            .map_err(|e| PipelineError::new(Stage::Diagnostics, Some(*model.spec()), e))
    }

    /// Fits the GPD tail of `model`'s standardized residuals.
    pub fn tail(&self, model: &FittedModel) -> Result<TailModel, PipelineError> {
        self.tail_estimator()
            .fit(model.standardized_residuals())
            .map_err(|e| PipelineError::new(Stage::Tail, Some(*model.spec()), e))
    }

    /// VaR and ES path from the end of `model`'s sample.
    pub fn forecast(&self, model: &FittedModel, tail: &TailModel) -> Result<ForecastPath, PipelineError> {
        let f = &self.config.forecast;
        VarForecaster::new(f.significance, f.horizon)
            .and_then(|forecaster| forecaster.forecast(model, tail))
            .map_err(|e| PipelineError::new(Stage::Forecast, Some(*model.spec()), e))
    }

    /// Filtered historical simulation, or `None` when disabled.
    pub fn bootstrap(&self, model: &FittedModel) -> Result<Option<BootstrapForecast>, PipelineError> {
        let b = &self.config.bootstrap;
        if !b.enabled {
            return Ok(None);
        }
        let f = &self.config.forecast;
        FilteredHistoricalSimulation::new(b.simulations, b.seed, f.significance, f.horizon)
            .and_then(|fhs| fhs.simulate(model))
            .map(Some)
            .map_err(|e| PipelineError::new(Stage::Bootstrap, Some(*model.spec()), e))
    }

    /// Rolling one-step forecasts of `spec` and their coverage tests.
    pub fn backtest(
        &self,
        spec: &ModelSpec,
        losses: &[f64],
    ) -> Result<(RollingBacktest, BacktestResult), PipelineError> {
        let wrap = |e: RiskError| PipelineError::new(Stage::Backtest, Some(*spec), e);
        let significance = self.config.forecast.significance;
        let b = &self.config.backtest;

        let forecaster = VarForecaster::new(significance, 1).map_err(wrap)?;
        let rolling = RollingForecaster::new(self.estimator(false), self.tail_estimator(), forecaster)
            .with_out_of_sample_fraction(b.out_of_sample_fraction)
            .with_refit_every(b.refit_every)
            .with_window(b.window)
            .run(spec, losses)
            .map_err(wrap)?;
        let result = Backtester::new(significance)
            .and_then(|bt| bt.backtest_rolling(losses, &rolling))
            .map_err(wrap)?;
        Ok((rolling, result))
    }

    /// Runs every stage on a price series.
    pub fn run_prices(&self, prices: &PriceSeries) -> Result<PipelineReport, PipelineError> {
        let returns = self.returns(prices)?;
        self.run(&returns)
    }

    /// Runs every stage on a return series.
    pub fn run(&self, returns: &ReturnSeries) -> Result<PipelineReport, PipelineError> {
        let summary = returns
            .summary()
            .map_err(|e| PipelineError::new(Stage::Returns, None, e))?;
        let losses = returns.losses();
        let data = losses.values();
        info!(observations = data.len(), "pipeline started");

        let selection = self.select(data)?;
        let model = self.estimate(&selection, data)?;
        let spec = *model.spec();
        let fit = model
            .summary()
            .map_err(|e| PipelineError::new(Stage::Estimation, Some(spec), e))?;

        let diagnostics = self.diagnostics(&model)?;
        let tail = self.tail(&model)?;
        let forecast = self.forecast(&model, &tail)?;
        let bootstrap = self.bootstrap(&model)?;
        let (rolling, backtest) = self.backtest(&spec, data)?;

        info!(
            %spec,
            var = forecast.next().map_or(f64::NAN, |f| f.var),
            pof_p_value = backtest.kupiec.pof.p_value,
            "pipeline finished"
        );
        Ok(PipelineReport {
            config: self.config.clone(),
            returns: summary,
            candidates: selection.candidates,
            selected: selection.selected,
            fit,
            diagnostics,
            tail,
            forecast,
            bootstrap,
            rolling,
            backtest,
        })
    }
}
