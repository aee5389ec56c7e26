//! Fit command implementation.
//!
//! Estimates one ARMA-GARCH model and checks its standardized residuals.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tailrisk_config::PipelineConfig;
use tailrisk_models::{FitSummary, ResidualDiagnostics};
use tailrisk_risk::Pipeline;

use crate::cli::OutputFormat;
use crate::commands::{fit_model, load_returns, DataArgs, ModelArgs};
use crate::output::{print_header, print_json, print_output};
use crate::tables::{diagnostic_rows, fit_rows, ParameterRow};

/// Arguments for the fit command.
#[derive(Args, Debug)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Lags for the Ljung-Box and ARCH-LM tests
    #[arg(long)]
    pub lags: Option<usize>,

    /// Skip the numerical Hessian and its standard errors
    #[arg(long)]
    pub no_std_errors: bool,
}

#[derive(Serialize)]
struct FitOutput {
    fit: FitSummary,
    diagnostics: ResidualDiagnostics,
}

/// Execute the fit command.
pub fn execute(args: FitArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    args.data.apply(&mut config);
    args.model.apply(&mut config);
    if let Some(lags) = args.lags {
        config.diagnostics.lags = lags;
    }
    if args.no_std_errors {
        config.estimation.std_errors = false;
    }

    let spec = args.model.spec(&config);
    let pipeline = Pipeline::new(config)?;
    let returns = load_returns(&args.data.input, pipeline.config())?;
    let losses = returns.losses();

    let model = fit_model(&pipeline, spec, losses.values())?;
    let fit = model.summary()?;
    let diagnostics = pipeline.diagnostics(&model)?;
    let parameters: Vec<ParameterRow> = fit.parameters.iter().map(ParameterRow::from).collect();

    match format {
        OutputFormat::Table => {
            print_header("Fit");
            print_output(&fit_rows(&fit), format)?;
            print_header("Parameters");
            print_output(&parameters, format)?;
            print_header(&format!("Residual Diagnostics ({} lags)", diagnostics.lags));
            print_output(&diagnostic_rows(&diagnostics), format)?;
        }
        OutputFormat::Json => print_json(&FitOutput { fit, diagnostics })?,
        OutputFormat::Csv => print_output(&parameters, format)?,
        OutputFormat::Minimal => println!("{:.6}", fit.log_likelihood),
    }

    Ok(())
}
