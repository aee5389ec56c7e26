//! Goodness-of-fit tests on standardized residuals.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tailrisk_math::linear_algebra::least_squares;
use tailrisk_math::stats;

use crate::error::{ModelError, ModelResult};
use crate::garch::FittedModel;

/// Default number of lags for the portmanteau and ARCH-LM tests.
pub const DEFAULT_LAGS: usize = 10;

/// A test statistic with its chi-squared p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestStatistic {
    /// Statistic value.
    pub statistic: f64,
    /// Degrees of freedom of the reference distribution.
    pub degrees_of_freedom: f64,
    /// Upper-tail probability.
    pub p_value: f64,
}

impl TestStatistic {
    fn chi_squared(statistic: f64, degrees_of_freedom: f64) -> ModelResult<Self> {
        Ok(Self {
            statistic,
            degrees_of_freedom,
            p_value: chi_squared_p_value(statistic, degrees_of_freedom)?,
        })
    }

    /// Whether the null is rejected at `level`.
    pub fn rejects(&self, level: f64) -> bool {
        self.p_value < level
    }
}

/// Upper-tail probability of a chi-squared statistic.
pub fn chi_squared_p_value(statistic: f64, degrees_of_freedom: f64) -> ModelResult<f64> {
    let chi = ChiSquared::new(degrees_of_freedom).map_err(|e| {
        ModelError::invalid_input(format!("chi-squared({degrees_of_freedom}): {e}"))
    })?;
    Ok(chi.sf(statistic.max(0.0)))
}

/// Ljung-Box portmanteau statistic `n(n+2) sum rho_k^2 / (n-k)`.
pub fn ljung_box(series: &[f64], lags: usize) -> ModelResult<TestStatistic> {
    if lags == 0 {
        return Err(ModelError::invalid_input("Ljung-Box needs at least one lag"));
    }
    let acf = stats::autocorrelation(series, lags)?;
    let n = series.len() as f64;
    let q: f64 = acf
        .iter()
        .enumerate()
        .map(|(i, rho)| rho * rho / (n - (i + 1) as f64))
        .sum::<f64>()
        * n
        * (n + 2.0);
    TestStatistic::chi_squared(q, lags as f64)
}

/// Engle's ARCH-LM test: `T R^2` from regressing `e_t^2` on a constant and
/// `lags` of its own lags.
pub fn arch_lm(series: &[f64], lags: usize) -> ModelResult<TestStatistic> {
    if lags == 0 {
        return Err(ModelError::invalid_input("ARCH-LM needs at least one lag"));
    }
    let squared: Vec<f64> = series.iter().map(|e| e * e).collect();
    let rows = squared.len().saturating_sub(lags);
    if rows <= lags + 1 {
        return Err(ModelError::InsufficientData {
            required: 2 * lags + 2,
            actual: series.len(),
        });
    }

    let x = DMatrix::from_fn(rows, lags + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            squared[lags + i - j]
        }
    });
    let y = DVector::from_iterator(rows, squared[lags..].iter().copied());
    let fit = least_squares(&x, &y)?;

    TestStatistic::chi_squared(rows as f64 * fit.r_squared, lags as f64)
}

/// Jarque-Bera normality statistic `n/6 (S^2 + K^2/4)`.
pub fn jarque_bera(series: &[f64]) -> ModelResult<TestStatistic> {
    let s = stats::skewness(series)?;
    let k = stats::excess_kurtosis(series)?;
    let n = series.len() as f64;
    TestStatistic::chi_squared(n / 6.0 * (s * s + 0.25 * k * k), 2.0)
}

/// Residual diagnostics for a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualDiagnostics {
    /// Lags used.
    pub lags: usize,
    /// Ljung-Box on standardized residuals.
    pub ljung_box: TestStatistic,
    /// Ljung-Box on squared standardized residuals.
    pub ljung_box_squared: TestStatistic,
    /// ARCH-LM on standardized residuals.
    pub arch_lm: TestStatistic,
    /// Jarque-Bera on standardized residuals.
    pub jarque_bera: TestStatistic,
    /// Skewness of standardized residuals.
    pub skewness: f64,
    /// Excess kurtosis of standardized residuals.
    pub excess_kurtosis: f64,
}

impl ResidualDiagnostics {
    /// Runs every test on the standardized residuals of `model`.
    pub fn for_model(model: &FittedModel, lags: usize) -> ModelResult<Self> {
        Self::compute(model.standardized_residuals(), lags)
    }

    /// Runs every test on `residuals`.
    pub fn compute(residuals: &[f64], lags: usize) -> ModelResult<Self> {
        let squared: Vec<f64> = residuals.iter().map(|z| z * z).collect();
        Ok(Self {
            lags,
            ljung_box: ljung_box(residuals, lags)?,
            ljung_box_squared: ljung_box(&squared, lags)?,
            arch_lm: arch_lm(residuals, lags)?,
            jarque_bera: jarque_bera(residuals)?,
            skewness: stats::skewness(residuals)?,
            excess_kurtosis: stats::excess_kurtosis(residuals)?,
        })
    }
}
