//! Table rows for pipeline results.

use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

use tailrisk_core::SeriesSummary;
use tailrisk_models::selection::Candidate;
use tailrisk_models::{FitSummary, ParameterEstimate, ResidualDiagnostics, TestStatistic};
use tailrisk_risk::bootstrap::BootstrapStep;
use tailrisk_risk::{BacktestResult, RollingBacktest, TailModel, VarForecast};

use crate::output::{fmt_f, fmt_opt, fmt_p_value, KeyValue};

/// Level at which diagnostic and coverage tests are flagged.
pub const TEST_LEVEL: f64 = 0.05;

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// Return series summary.
pub fn summary_rows(summary: &SeriesSummary) -> Vec<KeyValue> {
    vec![
        KeyValue::new("Observations", summary.observations.to_string()),
        KeyValue::new("First Date", fmt_date(summary.first_date)),
        KeyValue::new("Last Date", fmt_date(summary.last_date)),
        KeyValue::from_f64("Mean", summary.mean, 6),
        KeyValue::from_f64("Std Dev", summary.std_dev, 6),
        KeyValue::from_f64("Min", summary.min, 6),
        KeyValue::from_f64("Max", summary.max, 6),
        KeyValue::from_f64("Skewness", summary.skewness, 4),
        KeyValue::from_f64("Excess Kurtosis", summary.excess_kurtosis, 4),
    ]
}

/// One return observation.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ReturnRow {
    #[tabled(rename = "Day")]
    pub day: usize,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Return (%)")]
    pub value: f64,
    #[tabled(rename = "Loss (%)")]
    pub loss: f64,
}

impl ReturnRow {
    /// Row for day `day` of a return series.
    pub fn new(day: usize, date: Option<NaiveDate>, value: f64) -> Self {
        Self {
            day,
            date: fmt_date(date),
            value,
            loss: -value,
        }
    }
}

/// One candidate of the model ranking.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CandidateRow {
    #[tabled(rename = " ")]
    pub marker: String,
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "k")]
    pub num_params: usize,
    #[tabled(rename = "LogLik")]
    pub log_likelihood: String,
    #[tabled(rename = "AICC")]
    pub aicc: String,
    #[tabled(rename = "SBC")]
    pub sbc: String,
    #[tabled(rename = "HQC")]
    pub hqc: String,
    #[tabled(rename = "Persistence")]
    pub persistence: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Candidate rows with the selected one marked.
pub fn candidate_rows(candidates: &[Candidate], selected: usize) -> Vec<CandidateRow> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let ic = c.criteria.as_ref();
            let status = match (&c.error, c.persistence) {
                (Some(err), _) => format!("failed: {err}"),
                (None, Some(p)) if p >= 1.0 => "non-stationary".to_string(),
                (None, _) => "ok".to_string(),
            };
            CandidateRow {
                marker: if i == selected { "*".into() } else { String::new() },
                model: c.spec.to_string(),
                num_params: c.spec.num_params(),
                log_likelihood: fmt_opt(ic.map(|ic| ic.log_likelihood), 3),
                aicc: fmt_opt(ic.map(|ic| ic.aicc), 3),
                sbc: fmt_opt(ic.map(|ic| ic.sbc), 3),
                hqc: fmt_opt(ic.map(|ic| ic.hqc), 3),
                persistence: fmt_opt(c.persistence, 4),
                status,
            }
        })
        .collect()
}

/// Headline numbers of a fit.
pub fn fit_rows(fit: &FitSummary) -> Vec<KeyValue> {
    vec![
        KeyValue::new("Model", fit.spec.to_string()),
        KeyValue::new("Observations", fit.num_obs.to_string()),
        KeyValue::new("Iterations", fit.iterations.to_string()),
        KeyValue::from_f64("Log-Likelihood", fit.log_likelihood, 4),
        KeyValue::from_f64("AIC", fit.criteria.aic, 4),
        KeyValue::from_f64("AICC", fit.criteria.aicc, 4),
        KeyValue::from_f64("SBC", fit.criteria.sbc, 4),
        KeyValue::from_f64("HQC", fit.criteria.hqc, 4),
        KeyValue::from_f64("Persistence", fit.persistence, 4),
        KeyValue::new("Stationary", if fit.stationary { "yes" } else { "no" }),
    ]
}

/// One estimated parameter.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ParameterRow {
    #[tabled(rename = "Parameter")]
    pub name: String,
    #[tabled(rename = "Estimate")]
    pub estimate: String,
    #[tabled(rename = "Std Error")]
    pub std_error: String,
    #[tabled(rename = "t Value")]
    pub t_value: String,
}

impl From<&ParameterEstimate> for ParameterRow {
    fn from(p: &ParameterEstimate) -> Self {
        Self {
            name: p.name.clone(),
            estimate: fmt_f(p.value, 6),
            std_error: fmt_opt(p.std_error, 6),
            t_value: fmt_opt(p.t_value, 3),
        }
    }
}

/// One hypothesis test.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct TestRow {
    #[tabled(rename = "Test")]
    pub test: String,
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[tabled(rename = "df")]
    pub degrees_of_freedom: String,
    #[tabled(rename = "p-value")]
    pub p_value: String,
    #[tabled(rename = "Result")]
    pub result: String,
}

impl TestRow {
    /// Row for `test`, with `null` describing the hypothesis kept.
    pub fn new(test: &str, stat: &TestStatistic, null: &str, alternative: &str) -> Self {
        Self {
            test: test.to_string(),
            statistic: fmt_f(stat.statistic, 4),
            degrees_of_freedom: fmt_f(stat.degrees_of_freedom, 0),
            p_value: fmt_p_value(stat.p_value, TEST_LEVEL),
            result: if stat.rejects(TEST_LEVEL) {
                alternative.to_string()
            } else {
                null.to_string()
            },
        }
    }
}

/// Residual diagnostics of a fit.
pub fn diagnostic_rows(d: &ResidualDiagnostics) -> Vec<TestRow> {
    vec![
        TestRow::new("Ljung-Box z", &d.ljung_box, "no autocorrelation", "autocorrelated"),
        TestRow::new("Ljung-Box z²", &d.ljung_box_squared, "no autocorrelation", "autocorrelated"),
        TestRow::new("ARCH-LM", &d.arch_lm, "no ARCH effect", "ARCH effect"),
        TestRow::new("Jarque-Bera", &d.jarque_bera, "normal", "non-normal"),
    ]
}

/// Generalized Pareto tail.
pub fn tail_rows(tail: &TailModel) -> Vec<KeyValue> {
    vec![
        KeyValue::from_f64("Threshold", tail.threshold, 6),
        KeyValue::from_f64("Shape (xi)", tail.shape, 6),
        KeyValue::from_f64("Scale (beta)", tail.scale, 6),
        KeyValue::new(
            "Exceedances",
            format!("{} of {}", tail.num_exceedances, tail.num_obs),
        ),
        KeyValue::from_f64("Log-Likelihood", tail.log_likelihood, 4),
    ]
}

/// One step of a VaR/ES forecast path.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ForecastRow {
    #[tabled(rename = "h")]
    pub horizon: usize,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "Volatility")]
    pub volatility: String,
    #[tabled(rename = "VaR")]
    pub var: String,
    #[tabled(rename = "ES")]
    pub es: String,
    #[tabled(rename = "Parametric VaR")]
    pub parametric_var: String,
    #[tabled(rename = "Parametric ES")]
    pub parametric_es: String,
}

impl From<&VarForecast> for ForecastRow {
    fn from(f: &VarForecast) -> Self {
        Self {
            horizon: f.horizon,
            mean: fmt_f(f.mean, 4),
            volatility: fmt_f(f.volatility, 4),
            var: fmt_f(f.var, 4),
            es: fmt_f(f.es, 4),
            parametric_var: fmt_f(f.parametric_var, 4),
            parametric_es: fmt_f(f.parametric_es, 4),
        }
    }
}

/// One step of a filtered historical simulation.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct BootstrapRow {
    #[tabled(rename = "h")]
    pub horizon: usize,
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[tabled(rename = "VaR")]
    pub var: String,
    #[tabled(rename = "ES")]
    pub es: String,
}

impl From<&BootstrapStep> for BootstrapRow {
    fn from(s: &BootstrapStep) -> Self {
        Self {
            horizon: s.horizon,
            mean: fmt_f(s.mean, 4),
            var: fmt_f(s.var, 4),
            es: fmt_f(s.es, 4),
        }
    }
}

/// Exceedance counts of a backtest.
pub fn coverage_rows(result: &BacktestResult, rolling: &RollingBacktest) -> Vec<KeyValue> {
    let k = &result.kupiec;
    vec![
        KeyValue::new("Model", rolling.spec.to_string()),
        KeyValue::new("Window", rolling.window.to_string()),
        KeyValue::new("Days", k.observations.to_string()),
        KeyValue::new("Refits", rolling.refits().to_string()),
        KeyValue::new("Exceedances", k.exceedances.to_string()),
        KeyValue::from_f64("Expected", k.expected_exceedances, 2),
        KeyValue::from_percent("Exceedance Rate", k.exceedance_rate),
        KeyValue::from_percent("Significance", result.significance),
    ]
}

/// Kupiec and, when available, Christoffersen tests.
pub fn coverage_test_rows(result: &BacktestResult) -> Vec<TestRow> {
    let mut rows = vec![TestRow::new(
        "Kupiec POF",
        &result.kupiec.pof,
        "correct coverage",
        "wrong coverage",
    )];
    if let Some(c) = &result.christoffersen {
        rows.push(TestRow::new(
            "Christoffersen independence",
            &c.independence,
            "independent",
            "clustered",
        ));
        rows.push(TestRow::new(
            "Conditional coverage",
            &c.conditional_coverage,
            "correct coverage",
            "wrong coverage",
        ));
    }
    rows
}

/// One out-of-sample day.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct RollingRow {
    #[tabled(rename = "Day")]
    pub day: usize,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Loss")]
    pub realized: f64,
    #[tabled(rename = "VaR")]
    pub var: f64,
    #[tabled(rename = "ES")]
    pub es: f64,
    #[tabled(rename = "Exceeded")]
    pub exceeded: bool,
    #[tabled(rename = "Refit")]
    pub refitted: bool,
}

/// Per-day rows of a rolling backtest, dated from `date`.
pub fn rolling_rows(
    rolling: &RollingBacktest,
    date: impl Fn(usize) -> Option<NaiveDate>,
) -> Vec<RollingRow> {
    rolling
        .forecasts
        .iter()
        .map(|f| RollingRow {
            day: f.target,
            date: fmt_date(date(f.target)),
            realized: f.realized,
            var: f.forecast.var,
            es: f.forecast.es,
            exceeded: f.realized > f.forecast.var,
            refitted: f.refitted,
        })
        .collect()
}
