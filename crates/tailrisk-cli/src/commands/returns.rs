//! Returns command implementation.
//!
//! Builds percentage log-returns from a price file.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tailrisk_config::PipelineConfig;
use tailrisk_core::SeriesSummary;

use crate::cli::OutputFormat;
use crate::commands::{load_returns, DataArgs};
use crate::output::{print_header, print_json, print_output};
use crate::tables::{summary_rows, ReturnRow};

/// Arguments for the returns command.
#[derive(Args, Debug)]
pub struct ReturnsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// List every return instead of the summary
    #[arg(long)]
    pub list: bool,
}

#[derive(Serialize)]
struct ReturnsOutput {
    summary: SeriesSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    returns: Vec<ReturnRow>,
}

/// Execute the returns command.
pub fn execute(args: ReturnsArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    args.data.apply(&mut config);
    let returns = load_returns(&args.data.input, &config)?;
    let summary = returns.summary()?;

    let rows: Vec<ReturnRow> = if args.list {
        returns
            .values()
            .iter()
            .enumerate()
            .map(|(i, &r)| ReturnRow::new(i, returns.date(i), r))
            .collect()
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Table => {
            print_header("Return Series");
            print_output(&summary_rows(&summary), format)?;
            if args.list {
                print_header("Returns");
                print_output(&rows, format)?;
            }
        }
        OutputFormat::Json => print_json(&ReturnsOutput {
            summary,
            returns: rows,
        })?,
        OutputFormat::Csv if args.list => print_output(&rows, format)?,
        OutputFormat::Csv => print_output(&summary_rows(&summary), format)?,
        OutputFormat::Minimal => println!("{}", summary.observations),
    }

    Ok(())
}
