//! Return series construction.
//!
//! Returns are continuously compounded, expressed in percent, and net of a
//! daily risk-free accrual `r_f / 365`:
//!
//! ```text
//! r[i] = 100 * (ln P[i+1] - ln P[i] - r_f / 365)
//! ```

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tailrisk_math::stats;

use crate::data::PriceSeries;
use crate::error::{CoreError, CoreResult};

/// Calendar days used to de-annualize the risk-free rate.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// An immutable series of percentage log-returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dates: Option<Vec<NaiveDate>>,
}

impl ReturnSeries {
    /// Builds returns from raw price levels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if fewer than two prices are given
    /// or any price is non-positive or non-finite.
    pub fn from_prices(prices: &[f64], risk_free_rate: f64) -> CoreResult<Self> {
        if prices.len() < 2 {
            return Err(CoreError::invalid_input(format!(
                "need at least 2 prices, got {}",
                prices.len()
            )));
        }
        if !risk_free_rate.is_finite() {
            return Err(CoreError::invalid_input("risk-free rate must be finite"));
        }
        if let Some((i, p)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(CoreError::invalid_input(format!(
                "price at index {i} must be positive and finite, got {p}"
            )));
        }

        let daily_rf = risk_free_rate / DAYS_PER_YEAR;
        let values = prices
            .windows(2)
            .map(|w| 100.0 * (w[1].ln() - w[0].ln() - daily_rf))
            .collect();

        Ok(Self {
            values,
            dates: None,
        })
    }

    /// Builds returns from a dated price series, keeping the date of the later
    /// observation of each pair.
    pub fn from_price_series(prices: &PriceSeries, risk_free_rate: f64) -> CoreResult<Self> {
        let levels: Vec<f64> = prices.prices().collect();
        let mut series = Self::from_prices(&levels, risk_free_rate)?;
        series.dates = Some(prices.dates().skip(1).collect());
        Ok(series)
    }

    /// Wraps already computed returns.
    pub fn from_values(values: Vec<f64>) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::invalid_input("return series is empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::invalid_input("return series has non-finite values"));
        }
        Ok(Self {
            values,
            dates: None,
        })
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return values in percent.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Observation dates, when built from a dated price series.
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Date of the return at `index`, if known.
    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.get(index).copied())
    }

    /// The loss series `-r`, so that large losses sit in the upper tail.
    pub fn losses(&self) -> ReturnSeries {
        Self {
            values: self.values.iter().map(|v| -v).collect(),
            dates: self.dates.clone(),
        }
    }

    /// A contiguous sub-series.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> ReturnSeries {
        Self {
            values: self.values[range.clone()].to_vec(),
            dates: self.dates.as_ref().map(|d| d[range].to_vec()),
        }
    }

    /// Descriptive statistics of the series.
    pub fn summary(&self) -> CoreResult<SeriesSummary> {
        let v = &self.values;
        let map = |e: tailrisk_math::MathError| CoreError::invalid_input(e.to_string());
        Ok(SeriesSummary {
            observations: v.len(),
            mean: stats::mean(v),
            std_dev: stats::std_dev(v).map_err(map)?,
            min: v.iter().copied().fold(f64::INFINITY, f64::min),
            max: v.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            skewness: stats::skewness(v).map_err(map)?,
            excess_kurtosis: stats::excess_kurtosis(v).map_err(map)?,
            first_date: self.dates.as_ref().and_then(|d| d.first().copied()),
            last_date: self.dates.as_ref().and_then(|d| d.last().copied()),
        })
    }
}

/// Descriptive statistics of a return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of observations.
    pub observations: usize,
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Moment skewness.
    pub skewness: f64,
    /// Excess kurtosis.
    pub excess_kurtosis: f64,
    /// First date, if dated.
    pub first_date: Option<NaiveDate>,
    /// Last date, if dated.
    pub last_date: Option<NaiveDate>,
}
