//! Price data loading.
//!
//! Reads `(date, price)` rows from a CSV file with a header. The date column
//! is named `date` (case-insensitive) and formatted `YYYY-MM-DD`; the price
//! column is chosen by name. Rows whose price is missing (`""`, `NA`, `null`)
//! are skipped.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default price column.
pub const DEFAULT_PRICE_COLUMN: &str = "adjusted_close";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One dated price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Trading date.
    pub date: NaiveDate,
    /// Price level.
    pub price: f64,
}

/// Chronologically ordered prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    /// Builds a series, checking that dates strictly increase.
    pub fn new(observations: Vec<PriceObservation>) -> CoreResult<Self> {
        if let Some(w) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(CoreError::invalid_input(format!(
                "dates must be strictly increasing: {} follows {}",
                w[1].date, w[0].date
            )));
        }
        Ok(Self { observations })
    }

    /// Reads a CSV file from disk.
    pub fn from_csv_path(path: impl AsRef<Path>, price_column: &str) -> CoreResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let series = Self::from_csv_reader(file, price_column)?;
        tracing::debug!(
            path = %path.display(),
            rows = series.len(),
            "loaded price series"
        );
        Ok(series)
    }

    /// Reads CSV from any reader.
    pub fn from_csv_reader<R: Read>(reader: R, price_column: &str) -> CoreResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| CoreError::invalid_input(format!("missing column '{name}'")))
        };
        let date_idx = find("date")?;
        let price_idx = find(price_column)?;

        let mut observations = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let raw_price = field(price_idx);
            if is_missing(raw_price) {
                skipped += 1;
                continue;
            }

            let date = NaiveDate::parse_from_str(field(date_idx), DATE_FORMAT).map_err(|e| {
                CoreError::Parse {
                    line,
                    reason: format!("bad date '{}': {e}", field(date_idx)),
                }
            })?;
            let price: f64 = raw_price.parse().map_err(|_| CoreError::Parse {
                line,
                reason: format!("bad price '{raw_price}'"),
            })?;

            observations.push(PriceObservation { date, price });
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped rows with missing prices");
        }
        Self::new(observations)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether there are no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations.
    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    /// Price levels in order.
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.price)
    }

    /// Dates in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.observations.iter().map(|o| o.date)
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("null")
}
