//! End-to-end tests of the `tailrisk` binary.

use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use chrono::{Days, NaiveDate};
use predicates::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StudentT};
use tempfile::{NamedTempFile, TempDir};

/// Writes 600 daily prices whose log-returns follow GARCH(1,1) with t(5)
/// shocks. `close` is a constant multiple of `adjusted_close`.
fn price_file() -> NamedTempFile {
    let mut rng = StdRng::seed_from_u64(2024);
    let t = StudentT::new(5.0).unwrap();
    let scale = (3.0f64 / 5.0).sqrt();
    let (omega, alpha, beta) = (0.05, 0.08, 0.88);
    let mut h: f64 = omega / (1.0 - alpha - beta);

    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,close,adjusted_close").unwrap();
    let mut price = 100.0f64;
    for day in 0..600u64 {
        let date = start.checked_add_days(Days::new(day)).unwrap();
        writeln!(file, "{},{:.6},{:.6}", date, price * 2.0, price).unwrap();
        let shock = h.sqrt() * t.sample(&mut rng) * scale;
        h = omega + alpha * shock * shock + beta * h;
        price *= ((0.03 + shock) / 100.0).exp();
    }
    file.flush().unwrap();
    file
}

fn tailrisk() -> Command {
    let mut cmd = Command::cargo_bin("tailrisk").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("TAILRISK_CONFIG");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn input(file: &NamedTempFile) -> &Path {
    file.path()
}

#[test]
fn test_returns_summary() {
    let prices = price_file();
    tailrisk()
        .args(["--format", "minimal", "returns", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .stdout("599\n");

    tailrisk()
        .args(["returns", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .stdout(predicate::str::contains("Excess Kurtosis"))
        .stdout(predicate::str::contains("2020-01-02"));
}

#[test]
fn test_returns_listing_ignores_price_scale() {
    let prices = price_file();
    let adjusted = tailrisk()
        .args(["--format", "csv", "returns", "--list", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let close = tailrisk()
        .args(["--format", "csv", "returns", "--list", "--column", "close", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let adjusted = String::from_utf8(adjusted).unwrap();
    let close = String::from_utf8(close).unwrap();
    assert!(adjusted.starts_with("day,date,value,loss"));
    assert_eq!(adjusted.lines().count(), 600);

    // Returns are scale invariant up to the rounding of the written prices
    for (a, c) in adjusted.lines().zip(close.lines()).skip(1) {
        let a: f64 = a.split(',').nth(2).unwrap().parse().unwrap();
        let c: f64 = c.split(',').nth(2).unwrap().parse().unwrap();
        assert!((a - c).abs() < 1e-4, "{a} vs {c}");
    }
}

#[test]
fn test_select_ranks_candidates() {
    let prices = price_file();
    let json = json_output(
        tailrisk()
            .args(["--format", "json", "select", "--families", "norm,std"])
            .args(["--max-order", "0,0,1,1", "--input"])
            .arg(input(&prices)),
    );
    let candidates = json["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 8);
    assert_eq!(candidates[0]["spec"]["family"], "normal");
    assert!(json["selected"]["garch_r"].as_u64().is_some());
}

#[test]
fn test_fit_fixed_spec() {
    let prices = price_file();
    let json = json_output(
        tailrisk()
            .args(["--format", "json", "fit", "--spec", "0,0,1,1,norm", "--input"])
            .arg(input(&prices)),
    );
    assert_eq!(json["fit"]["spec"]["garch_r"], 1);
    assert_eq!(json["fit"]["spec"]["garch_s"], 1);
    let names: Vec<&str> = json["fit"]["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["mu", "omega", "alpha1", "beta1"]);
    assert_eq!(json["diagnostics"]["lags"], 10);

    tailrisk()
        .args(["fit", "--spec", "0,0,1,1,norm", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .stdout(predicate::str::contains("Ljung-Box"))
        .stdout(predicate::str::contains("omega"));
}

#[test]
fn test_forecast_path_and_bootstrap() {
    let prices = price_file();
    let json = json_output(
        tailrisk()
            .args(["--format", "json", "forecast", "--spec", "0,0,1,1,std"])
            .args(["--horizon", "3", "--simulations", "500", "--input"])
            .arg(input(&prices)),
    );
    let steps = json["forecast"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    for step in steps {
        assert!(step["es"].as_f64().unwrap() > step["var"].as_f64().unwrap());
    }
    assert_eq!(json["bootstrap"]["steps"].as_array().unwrap().len(), 3);
    assert_eq!(json["forecast"]["origin"], 599);

    let no_bootstrap = json_output(
        tailrisk()
            .args(["--format", "json", "forecast", "--spec", "0,0,1,1,std"])
            .args(["--horizon", "1", "--no-bootstrap", "--input"])
            .arg(input(&prices)),
    );
    assert!(no_bootstrap["bootstrap"].is_null());
}

#[test]
fn test_backtest_days() {
    let prices = price_file();
    let output = tailrisk()
        .args(["--format", "csv", "backtest", "--spec", "0,0,1,1,norm"])
        .args(["--refit-every", "50", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("day,date,realized,var,es,exceeded,refitted")
    );
    // 10% of 599 returns held out
    assert_eq!(lines.count(), 60);

    tailrisk()
        .args(["backtest", "--spec", "0,0,1,1,norm", "--window", "expanding", "--input"])
        .arg(input(&prices))
        .assert()
        .success()
        .stdout(predicate::str::contains("Kupiec POF"))
        .stdout(predicate::str::contains("expanding"));
}

#[test]
fn test_report_writes_json() {
    let prices = price_file();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.json");

    tailrisk()
        .args(["--format", "minimal", "--set", "bootstrap.simulations=500"])
        .args(["report", "--families", "norm", "--max-order", "0,0,1,1", "--input"])
        .arg(input(&prices))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^-?\d+\.\d{6}\n$").unwrap());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["returns"]["observations"], 599);
    assert_eq!(report["candidates"].as_array().unwrap().len(), 4);
    assert_eq!(report["config"]["bootstrap"]["simulations"], 500);
    assert!(report["backtest"]["kupiec"]["pof"]["p_value"].is_number());
}

#[test]
fn test_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.toml");

    tailrisk()
        .args(["--set", "forecast.significance=0.025", "config", "init"])
        .arg(&path)
        .assert()
        .success();
    // Refuses to clobber without --force
    tailrisk()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    tailrisk()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .success();

    let json = json_output(
        tailrisk()
            .arg("--config")
            .arg(&path)
            .args(["--format", "json", "config", "show"]),
    );
    assert_eq!(json["forecast"]["significance"], 0.025);
    assert_eq!(json["backtest"]["window"], "moving");
}

#[test]
fn test_invalid_config_reports_every_field() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[forecast]\nsignificance = 0.0\n\n[tail]\nmin_exceedances = 1").unwrap();

    tailrisk()
        .arg("--config")
        .arg(file.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forecast.significance"))
        .stderr(predicate::str::contains("tail.min_exceedances"));

    tailrisk()
        .args(["--set", "forecast.horizon=0", "config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forecast.horizon"));
}

#[test]
fn test_bad_arguments() {
    let prices = price_file();
    tailrisk()
        .args(["fit", "--spec", "1,1,norm", "--input"])
        .arg(input(&prices))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid model specification"));

    tailrisk()
        .args(["returns", "--input", "/no/such/prices.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Data error"));

    tailrisk()
        .args(["--set", "forecast.nope=1", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forecast.nope"));
}
