//! Integration tests: CSV on disk to dated return series.

use std::io::Write;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use tailrisk_core::data::DEFAULT_PRICE_COLUMN;
use tailrisk_core::prelude::*;

fn write_prices(rows: &[(&str, f64)]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,adjusted_close").unwrap();
    for (date, price) in rows {
        writeln!(file, "{date},{price}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_dated_returns_from_file() {
    let file = write_prices(&[
        ("2021-03-01", 100.0),
        ("2021-03-02", 102.0),
        ("2021-03-03", 101.0),
        ("2021-03-04", 104.0),
    ]);

    let prices = PriceSeries::from_csv_path(file.path(), DEFAULT_PRICE_COLUMN).unwrap();
    let returns = ReturnSeries::from_price_series(&prices, 0.0).unwrap();

    assert_eq!(returns.len(), 3);
    assert_eq!(
        returns.date(0),
        Some(NaiveDate::from_ymd_opt(2021, 3, 2).unwrap())
    );
    assert_relative_eq!(returns.values()[2], 100.0 * (104.0f64 / 101.0).ln(), epsilon = 1e-12);

    let summary = returns.summary().unwrap();
    assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2021, 3, 4));
}

#[test]
fn test_losses_keep_dates() {
    let file = write_prices(&[("2021-03-01", 10.0), ("2021-03-02", 11.0), ("2021-03-03", 9.0)]);
    let prices = PriceSeries::from_csv_path(file.path(), DEFAULT_PRICE_COLUMN).unwrap();
    let returns = ReturnSeries::from_price_series(&prices, 0.0).unwrap();
    let losses = returns.losses();

    assert_eq!(losses.dates(), returns.dates());
    assert!(losses.values()[0] < 0.0);
    assert!(losses.values()[1] > 0.0);
}

#[test]
fn test_missing_file() {
    let err = PriceSeries::from_csv_path("/nonexistent/prices.csv", DEFAULT_PRICE_COLUMN)
        .unwrap_err();
    assert!(matches!(err, CoreError::Io(_)));
}
