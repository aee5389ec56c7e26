//! Backtest command implementation.
//!
//! Rolls one-step VaR forecasts through the held-out end of the sample and
//! tests their coverage.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tailrisk_config::{PipelineConfig, WindowKind};
use tailrisk_core::ReturnSeries;
use tailrisk_risk::{BacktestResult, Pipeline, RollingBacktest};

use crate::cli::OutputFormat;
use crate::commands::{load_returns, DataArgs, ModelArgs};
use crate::output::{print_header, print_json, print_output};
use crate::tables::{coverage_rows, coverage_test_rows, rolling_rows};

/// Arguments for the backtest command.
#[derive(Args, Debug)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// VaR significance level alpha
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Estimation window: moving or expanding
    #[arg(short, long)]
    pub window: Option<WindowKind>,

    /// Share of the sample held out for out-of-sample forecasts
    #[arg(long)]
    pub out_of_sample: Option<f64>,

    /// Days between parameter re-estimations
    #[arg(long)]
    pub refit_every: Option<usize>,

    /// List every out-of-sample day
    #[arg(long)]
    pub days: bool,
}

impl BacktestArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        self.data.apply(config);
        self.model.apply(config);
        if let Some(alpha) = self.alpha {
            config.forecast.significance = alpha;
        }
        if let Some(window) = self.window {
            config.backtest.window = window;
        }
        if let Some(fraction) = self.out_of_sample {
            config.backtest.out_of_sample_fraction = fraction;
        }
        if let Some(days) = self.refit_every {
            config.backtest.refit_every = days;
        }
    }
}

#[derive(Serialize)]
struct BacktestOutput {
    result: BacktestResult,
    rolling: RollingBacktest,
}

/// Execute the backtest command.
pub fn execute(args: BacktestArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    args.apply(&mut config);

    let spec = args.model.spec(&config);
    let pipeline = Pipeline::new(config)?;
    let returns = load_returns(&args.data.input, pipeline.config())?;
    let losses = returns.losses();

    // Without a fixed spec, select on the whole sample and backtest the winner
    let spec = match spec {
        Some(spec) => spec,
        None => *pipeline.select(losses.values())?.spec(),
    };
    let (rolling, result) = pipeline.backtest(&spec, losses.values())?;

    match format {
        OutputFormat::Table => {
            print_table(&rolling, &result, &returns, args.days, format)?;
        }
        OutputFormat::Json => print_json(&BacktestOutput { result, rolling })?,
        OutputFormat::Csv => {
            print_output(&rolling_rows(&rolling, |i| returns.date(i)), format)?;
        }
        OutputFormat::Minimal => println!("{:.6}", result.kupiec.pof.p_value),
    }

    Ok(())
}

/// Prints coverage counts, tests and optionally every day.
pub fn print_table(
    rolling: &RollingBacktest,
    result: &BacktestResult,
    returns: &ReturnSeries,
    days: bool,
    format: OutputFormat,
) -> Result<()> {
    print_header("VaR Backtest");
    print_output(&coverage_rows(result, rolling), format)?;
    print_header("Coverage Tests");
    print_output(&coverage_test_rows(result), format)?;
    if days {
        print_header("Out-of-Sample Days");
        print_output(&rolling_rows(rolling, |i| returns.date(i)), format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_spec;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BacktestArgs,
    }

    #[test]
    fn test_flags_override_config() {
        let harness = Harness::parse_from([
            "backtest",
            "--input",
            "prices.csv",
            "--spec",
            "0,0,1,1,norm",
            "--window",
            "expanding",
            "--alpha",
            "0.05",
            "--refit-every",
            "10",
        ]);
        let mut config = PipelineConfig::default();
        harness.args.apply(&mut config);

        assert_eq!(config.backtest.window, WindowKind::Expanding);
        assert_eq!(config.forecast.significance, 0.05);
        assert_eq!(config.backtest.refit_every, 10);
        assert_eq!(config.backtest.out_of_sample_fraction, 0.1);
        assert_eq!(
            harness.args.model.spec,
            Some(parse_spec("0,0,1,1,norm").unwrap())
        );
    }
}
