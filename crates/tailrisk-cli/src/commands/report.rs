//! Report command implementation.
//!
//! Runs every pipeline stage and prints the full report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tailrisk_config::PipelineConfig;
use tailrisk_risk::{Pipeline, PipelineReport};

use crate::cli::OutputFormat;
use crate::commands::{backtest, forecast, load_returns, DataArgs, ModelArgs};
use crate::output::{print_header, print_json, print_output, print_success, print_warning, KeyValue};
use crate::tables::{
    candidate_rows, diagnostic_rows, fit_rows, summary_rows, tail_rows, ParameterRow,
};

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Also write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List every out-of-sample day of the backtest
    #[arg(long)]
    pub days: bool,
}

/// Execute the report command.
pub fn execute(args: ReportArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    if args.model.spec.is_some() {
        print_warning("--spec is ignored by report; the model is always selected");
    }
    args.data.apply(&mut config);
    args.model.apply(&mut config);

    let pipeline = Pipeline::new(config)?;
    let returns = load_returns(&args.data.input, pipeline.config())?;
    let report = pipeline.run(&returns)?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    match format {
        OutputFormat::Table => {
            print_header("Return Series");
            print_output(&summary_rows(&report.returns), format)?;
            print_header("Model Selection");
            print_output(&candidate_rows(&report.candidates, report.selected), format)?;
            print_header("Fit");
            print_output(&fit_rows(&report.fit), format)?;
            let parameters: Vec<ParameterRow> =
                report.fit.parameters.iter().map(ParameterRow::from).collect();
            print_output(&parameters, format)?;
            print_header("Residual Diagnostics");
            print_output(&diagnostic_rows(&report.diagnostics), format)?;
            print_header("GPD Tail");
            print_output(&tail_rows(&report.tail), format)?;
            forecast::print_table_path(&report.forecast, report.bootstrap.as_ref(), format)?;
            backtest::print_table(&report.rolling, &report.backtest, &returns, args.days, format)?;
        }
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Csv => print_output(&headline_rows(&report), format)?,
        OutputFormat::Minimal => {
            if let Some(next) = report.forecast.next() {
                println!("{:.6}", next.var);
            }
        }
    }

    if let (Some(path), OutputFormat::Table) = (&args.output, format) {
        print_success(&format!("Report written to {}", path.display()));
    }
    Ok(())
}

/// One-line-per-metric digest of a report.
fn headline_rows(report: &PipelineReport) -> Vec<KeyValue> {
    let mut rows = vec![
        KeyValue::new("model", report.spec().to_string()),
        KeyValue::new("observations", report.returns.observations.to_string()),
        KeyValue::from_f64("significance", report.forecast.significance, 4),
    ];
    if let Some(next) = report.forecast.next() {
        rows.push(KeyValue::from_f64("var", next.var, 6));
        rows.push(KeyValue::from_f64("es", next.es, 6));
    }
    let kupiec = &report.backtest.kupiec;
    rows.push(KeyValue::new("exceedances", kupiec.exceedances.to_string()));
    rows.push(KeyValue::from_f64("kupiec_p_value", kupiec.pof.p_value, 6));
    if let Some(c) = &report.backtest.christoffersen {
        rows.push(KeyValue::from_f64(
            "conditional_coverage_p_value",
            c.conditional_coverage.p_value,
            6,
        ));
    }
    rows
}
