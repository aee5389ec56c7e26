//! Pipeline configuration.
//!
//! Every stage of the VaR pipeline reads its settings from one section of
//! [`PipelineConfig`]. All sections have serde defaults, so a TOML file only
//! needs the keys it overrides:
//!
//! ```toml
//! [data]
//! risk_free_rate = 0.02
//!
//! [selection]
//! families = ["normal", "student_t"]
//! max_p = 1
//!
//! [forecast]
//! significance = 0.05
//! ```

use serde::{Deserialize, Serialize};
use tailrisk_core::DistributionFamily;

use crate::error::{Validate, ValidationError};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input data settings.
    pub data: DataConfig,
    /// Model search space.
    pub selection: SelectionConfig,
    /// Optimizer settings.
    pub estimation: EstimationConfig,
    /// Tail estimation settings.
    pub tail: TailConfig,
    /// VaR forecast settings.
    pub forecast: ForecastConfig,
    /// Rolling backtest settings.
    pub backtest: BacktestConfig,
    /// Filtered historical simulation settings.
    pub bootstrap: BootstrapConfig,
    /// Residual diagnostics settings.
    pub diagnostics: DiagnosticsConfig,
}

impl PipelineConfig {
    /// Sets the VaR significance level.
    #[must_use]
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.forecast.significance = significance;
        self
    }

    /// Restricts the candidate innovation families.
    #[must_use]
    pub fn with_families(mut self, families: Vec<DistributionFamily>) -> Self {
        self.selection.families = families;
        self
    }

    /// Sets the largest ARMA and GARCH orders searched.
    #[must_use]
    pub fn with_max_orders(mut self, p: usize, q: usize, r: usize, s: usize) -> Self {
        self.selection.max_p = p;
        self.selection.max_q = q;
        self.selection.max_r = r;
        self.selection.max_s = s;
        self
    }

    /// Sets the annual risk-free rate.
    #[must_use]
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.data.risk_free_rate = rate;
        self
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        errors.extend(self.data.validate());
        errors.extend(self.selection.validate());
        errors.extend(self.estimation.validate());
        errors.extend(self.tail.validate());
        errors.extend(self.forecast.validate());
        errors.extend(self.backtest.validate());
        errors.extend(self.bootstrap.validate());
        errors.extend(self.diagnostics.validate());

        // The GPD quantile only exists inside the modelled tail
        let alpha = self.forecast.significance;
        let fraction = self.tail.tail_fraction;
        if alpha > 0.0 && fraction > 0.0 && fraction < 1.0 && alpha < 1.0 && alpha > fraction {
            errors.push(ValidationError::with_rule(
                "forecast.significance",
                format!("must not exceed tail.tail_fraction ({fraction}), got {alpha}"),
                "within_tail",
            ));
        }
        errors
    }
}

fn check_open_unit(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !(value > 0.0 && value < 1.0) {
        errors.push(ValidationError::with_rule(
            field,
            format!("must lie in (0, 1), got {value}"),
            "open_unit_interval",
        ));
    }
}

fn check_positive<T: PartialOrd + Default + std::fmt::Display>(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: T,
) {
    if value <= T::default() {
        errors.push(ValidationError::with_rule(
            field,
            format!("must be positive, got {value}"),
            "positive",
        ));
    }
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Input data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Price column read from the CSV file.
    #[serde(default = "default_price_column")]
    pub price_column: String,
    /// Annual risk-free rate, as a decimal.
    #[serde(default)]
    pub risk_free_rate: f64,
}

fn default_price_column() -> String {
    tailrisk_core::data::DEFAULT_PRICE_COLUMN.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            price_column: default_price_column(),
            risk_free_rate: 0.0,
        }
    }
}

impl Validate for DataConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.price_column.trim().is_empty() {
            errors.push(ValidationError::new("data.price_column", "must not be empty"));
        }
        if !self.risk_free_rate.is_finite() {
            errors.push(ValidationError::new("data.risk_free_rate", "must be finite"));
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Model search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Candidate innovation families.
    #[serde(default = "default_families")]
    pub families: Vec<DistributionFamily>,
    /// Largest AR order.
    #[serde(default = "default_max_order")]
    pub max_p: usize,
    /// Largest MA order.
    #[serde(default = "default_max_order")]
    pub max_q: usize,
    /// Largest ARCH order.
    #[serde(default = "default_max_order")]
    pub max_r: usize,
    /// Largest GARCH order.
    #[serde(default = "default_max_order")]
    pub max_s: usize,
    /// Whether to estimate a constant mean.
    #[serde(default = "default_true")]
    pub include_mean: bool,
    /// Drop candidates with persistence of one or more.
    #[serde(default = "default_true")]
    pub require_stationary: bool,
    /// Fit candidates in parallel (needs the `parallel` feature).
    #[serde(default)]
    pub parallel: bool,
}

fn default_families() -> Vec<DistributionFamily> {
    DistributionFamily::ALL.to_vec()
}

fn default_max_order() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            families: default_families(),
            max_p: default_max_order(),
            max_q: default_max_order(),
            max_r: default_max_order(),
            max_s: default_max_order(),
            include_mean: true,
            require_stationary: true,
            parallel: false,
        }
    }
}

impl SelectionConfig {
    /// Number of specifications in the grid.
    pub fn num_candidates(&self) -> usize {
        self.families.len()
            * (self.max_p + 1)
            * (self.max_q + 1)
            * (self.max_r + 1)
            * (self.max_s + 1)
    }
}

impl Validate for SelectionConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.families.is_empty() {
            errors.push(ValidationError::new(
                "selection.families",
                "at least one distribution family is required",
            ));
        }
        let mut seen = Vec::with_capacity(self.families.len());
        for family in &self.families {
            if seen.contains(family) {
                errors.push(ValidationError::with_rule(
                    "selection.families",
                    format!("{family} listed more than once"),
                    "unique",
                ));
            }
            seen.push(*family);
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Optimizer settings for maximum likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Iteration budget per fit.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Objective tolerance.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Simplex size tolerance.
    #[serde(default = "default_parameter_tolerance")]
    pub parameter_tolerance: f64,
    /// Nelder-Mead restarts from the previous optimum.
    #[serde(default = "default_restarts")]
    pub restarts: u32,
    /// Report Hessian standard errors for the selected fit.
    #[serde(default = "default_true")]
    pub std_errors: bool,
}

fn default_max_iterations() -> u32 {
    20_000
}

fn default_tolerance() -> f64 {
    1e-9
}

fn default_parameter_tolerance() -> f64 {
    1e-6
}

fn default_restarts() -> u32 {
    1
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            parameter_tolerance: default_parameter_tolerance(),
            restarts: default_restarts(),
            std_errors: true,
        }
    }
}

impl Validate for EstimationConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_positive(&mut errors, "estimation.max_iterations", self.max_iterations);
        check_positive(&mut errors, "estimation.tolerance", self.tolerance);
        check_positive(
            &mut errors,
            "estimation.parameter_tolerance",
            self.parameter_tolerance,
        );
        errors
    }
}

// ---------------------------------------------------------------------------
// Tail
// ---------------------------------------------------------------------------

/// Peaks-over-threshold settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailConfig {
    /// Fraction of residuals above the threshold.
    #[serde(default = "default_tail_fraction")]
    pub tail_fraction: f64,
    /// Smallest acceptable number of exceedances.
    #[serde(default = "default_min_exceedances")]
    pub min_exceedances: usize,
}

fn default_tail_fraction() -> f64 {
    0.1
}

fn default_min_exceedances() -> usize {
    20
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            tail_fraction: default_tail_fraction(),
            min_exceedances: default_min_exceedances(),
        }
    }
}

impl Validate for TailConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_open_unit(&mut errors, "tail.tail_fraction", self.tail_fraction);
        if self.min_exceedances < 3 {
            errors.push(ValidationError::with_rule(
                "tail.min_exceedances",
                format!("must be at least 3, got {}", self.min_exceedances),
                "minimum",
            ));
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// VaR forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Significance level `alpha`; VaR is the `1 - alpha` loss quantile.
    #[serde(default = "default_significance")]
    pub significance: f64,
    /// Forecast horizon in days.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

fn default_significance() -> f64 {
    0.01
}

fn default_horizon() -> usize {
    10
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            significance: default_significance(),
            horizon: default_horizon(),
        }
    }
}

impl Validate for ForecastConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_open_unit(&mut errors, "forecast.significance", self.significance);
        check_positive(&mut errors, "forecast.horizon", self.horizon);
        errors
    }
}

// ---------------------------------------------------------------------------
// Backtest
// ---------------------------------------------------------------------------

/// Estimation window used in rolling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Fixed length, slides forward one day at a time.
    #[default]
    Moving,
    /// Anchored at the first observation, grows one day at a time.
    Expanding,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Moving => write!(f, "moving"),
            WindowKind::Expanding => write!(f, "expanding"),
        }
    }
}

impl std::str::FromStr for WindowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "moving" | "rolling" => Ok(WindowKind::Moving),
            "expanding" | "anchored" => Ok(WindowKind::Expanding),
            other => Err(format!("unknown window kind '{other}'")),
        }
    }
}

/// Rolling backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Share of the sample held out for out-of-sample forecasts.
    #[serde(default = "default_out_of_sample_fraction")]
    pub out_of_sample_fraction: f64,
    /// Days between parameter re-estimations.
    #[serde(default = "default_refit_every")]
    pub refit_every: usize,
    /// Estimation window kind.
    #[serde(default)]
    pub window: WindowKind,
}

fn default_out_of_sample_fraction() -> f64 {
    0.1
}

fn default_refit_every() -> usize {
    25
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            out_of_sample_fraction: default_out_of_sample_fraction(),
            refit_every: default_refit_every(),
            window: WindowKind::default(),
        }
    }
}

impl Validate for BacktestConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_open_unit(
            &mut errors,
            "backtest.out_of_sample_fraction",
            self.out_of_sample_fraction,
        );
        check_positive(&mut errors, "backtest.refit_every", self.refit_every);
        errors
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Filtered historical simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Whether the pipeline runs the simulation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of simulated paths.
    #[serde(default = "default_simulations")]
    pub simulations: usize,
    /// Random seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_simulations() -> usize {
    10_000
}

fn default_seed() -> u64 {
    42
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            simulations: default_simulations(),
            seed: default_seed(),
        }
    }
}

impl Validate for BootstrapConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.enabled {
            check_positive(&mut errors, "bootstrap.simulations", self.simulations);
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Residual diagnostics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Lags for Ljung-Box and ARCH-LM.
    #[serde(default = "default_lags")]
    pub lags: usize,
}

fn default_lags() -> usize {
    10
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { lags: default_lags() }
    }
}

impl Validate for DiagnosticsConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_positive(&mut errors, "diagnostics.lags", self.lags);
        errors
    }
}
