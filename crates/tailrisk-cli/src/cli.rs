//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tailrisk_config::ConfigOverride;

use crate::commands::{
    BacktestArgs, ConfigArgs, FitArgs, ForecastArgs, ReportArgs, ReturnsArgs, SelectArgs,
};

/// tailrisk - GARCH-EVT value-at-risk estimation and backtesting
#[derive(Parser)]
#[command(name = "tailrisk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true, env = "TAILRISK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override a configuration value, e.g. `--set forecast.significance=0.05`
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<ConfigOverride>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the return series from a price file and summarize it
    Returns(ReturnsArgs),

    /// Fit every candidate specification and rank them
    Select(SelectArgs),

    /// Fit one specification (or the selected one) and show its parameters
    Fit(FitArgs),

    /// Forecast VaR and expected shortfall from the end of the sample
    Forecast(ForecastArgs),

    /// Rolling out-of-sample VaR forecasts with coverage tests
    Backtest(BacktestArgs),

    /// Run the full pipeline
    Report(ReportArgs),

    /// Show, write or validate pipeline configuration
    Config(ConfigArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the headline value)
    Minimal,
}
