//! Select command implementation.
//!
//! Fits every candidate specification and ranks them by AICC.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tailrisk_config::PipelineConfig;
use tailrisk_core::ModelSpec;
use tailrisk_models::selection::Candidate;
use tailrisk_risk::Pipeline;

use crate::cli::OutputFormat;
use crate::commands::{load_returns, DataArgs, ModelArgs};
use crate::output::{print_header, print_json, print_output, print_warning};
use crate::tables::candidate_rows;

/// Arguments for the select command.
#[derive(Args, Debug)]
pub struct SelectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Serialize)]
struct SelectOutput<'a> {
    selected: &'a ModelSpec,
    candidates: &'a [Candidate],
}

/// Execute the select command.
pub fn execute(args: SelectArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    if args.model.spec.is_some() {
        print_warning("--spec is ignored by select; every candidate is fitted");
    }
    args.data.apply(&mut config);
    args.model.apply(&mut config);

    let pipeline = Pipeline::new(config)?;
    let returns = load_returns(&args.data.input, pipeline.config())?;
    let losses = returns.losses();
    let selection = pipeline.select(losses.values())?;

    match format {
        OutputFormat::Table => {
            print_header(&format!(
                "Model Selection ({} candidates, {} observations)",
                selection.candidates.len(),
                losses.len()
            ));
            print_output(&candidate_rows(&selection.candidates, selection.selected), format)?;
            println!("\nSelected: {}", selection.spec());
        }
        OutputFormat::Json => print_json(&SelectOutput {
            selected: selection.spec(),
            candidates: &selection.candidates,
        })?,
        OutputFormat::Csv => {
            print_output(&candidate_rows(&selection.candidates, selection.selected), format)?;
        }
        OutputFormat::Minimal => println!("{}", selection.spec()),
    }

    Ok(())
}
