//! tailrisk CLI - GARCH-EVT value-at-risk from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Summarize returns built from a price file
//! tailrisk returns --input spx.csv
//!
//! # Rank every ARMA-GARCH candidate
//! tailrisk select --input spx.csv --families norm,std --max-order 1,1,2,2
//!
//! # 10-day VaR/ES at 1% from ARMA(0,0)-GARCH(1,1) with Student-t shocks
//! tailrisk forecast --input spx.csv --spec 0,0,1,1,std --horizon 10
//!
//! # Rolling backtest with Kupiec and Christoffersen tests
//! tailrisk backtest --input spx.csv --spec 0,0,1,1,std --window expanding
//!
//! # Everything, as JSON
//! tailrisk --format json --config pipeline.toml report --input spx.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tailrisk_config::PipelineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod output;
mod tables;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let format = cli.format;
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Returns(args) => commands::returns::execute(args, config, format)?,
        Commands::Select(args) => commands::select::execute(args, config, format)?,
        Commands::Fit(args) => commands::fit::execute(args, config, format)?,
        Commands::Forecast(args) => commands::forecast::execute(args, config, format)?,
        Commands::Backtest(args) => commands::backtest::execute(args, config, format)?,
        Commands::Report(args) => commands::report::execute(args, config, format)?,
        Commands::Config(args) => commands::config::execute(args, config, cli.config, format)?,
    }

    Ok(())
}

/// Logs go to stderr so that stdout stays machine readable.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Configuration file (or defaults) with `--set` overrides applied.
///
/// Validation happens when a pipeline is built, or in `config validate`.
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let base = match &cli.config {
        Some(path) => PipelineConfig::read(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if cli.overrides.is_empty() {
        return Ok(base);
    }
    tracing::debug!(count = cli.overrides.len(), "applying configuration overrides");
    base.with_overrides(&cli.overrides)
        .context("failed to apply configuration overrides")
}
