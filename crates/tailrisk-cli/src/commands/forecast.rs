//! Forecast command implementation.
//!
//! Fits the model and its GPD tail, then forecasts VaR and expected
//! shortfall from the last observation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tailrisk_config::PipelineConfig;
use tailrisk_risk::{BootstrapForecast, ForecastPath, Pipeline, TailModel};

use crate::cli::OutputFormat;
use crate::commands::{fit_model, load_returns, DataArgs, ModelArgs};
use crate::output::{print_header, print_json, print_output};
use crate::tables::{tail_rows, BootstrapRow, ForecastRow};

/// Arguments for the forecast command.
#[derive(Args, Debug)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// VaR significance level alpha, e.g. 0.01 for 99% VaR
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Number of days to forecast
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Share of standardized residuals treated as the tail
    #[arg(long)]
    pub tail_fraction: Option<f64>,

    /// Skip the filtered historical simulation
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Simulated paths for the filtered historical simulation
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Random seed for the filtered historical simulation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ForecastArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        self.data.apply(config);
        self.model.apply(config);
        if let Some(alpha) = self.alpha {
            config.forecast.significance = alpha;
        }
        if let Some(horizon) = self.horizon {
            config.forecast.horizon = horizon;
        }
        if let Some(fraction) = self.tail_fraction {
            config.tail.tail_fraction = fraction;
        }
        if self.no_bootstrap {
            config.bootstrap.enabled = false;
        }
        if let Some(simulations) = self.simulations {
            config.bootstrap.simulations = simulations;
        }
        if let Some(seed) = self.seed {
            config.bootstrap.seed = seed;
        }
    }
}

#[derive(Serialize)]
struct ForecastOutput {
    tail: TailModel,
    forecast: ForecastPath,
    bootstrap: Option<BootstrapForecast>,
}

/// Execute the forecast command.
pub fn execute(args: ForecastArgs, mut config: PipelineConfig, format: OutputFormat) -> Result<()> {
    args.apply(&mut config);

    let spec = args.model.spec(&config);
    let pipeline = Pipeline::new(config)?;
    let returns = load_returns(&args.data.input, pipeline.config())?;
    let losses = returns.losses();

    let model = fit_model(&pipeline, spec, losses.values())?;
    let tail = pipeline.tail(&model)?;
    let forecast = pipeline.forecast(&model, &tail)?;
    let bootstrap = pipeline.bootstrap(&model)?;

    match format {
        OutputFormat::Table => {
            print_header(&format!("GPD Tail of {}", model.spec()));
            print_output(&tail_rows(&tail), format)?;
            print_table_path(&forecast, bootstrap.as_ref(), format)?;
        }
        OutputFormat::Json => print_json(&ForecastOutput {
            tail,
            forecast,
            bootstrap,
        })?,
        OutputFormat::Csv => {
            let rows: Vec<ForecastRow> = forecast.steps.iter().map(ForecastRow::from).collect();
            print_output(&rows, format)?;
        }
        OutputFormat::Minimal => {
            if let Some(next) = forecast.next() {
                println!("{:.6}", next.var);
            }
        }
    }

    Ok(())
}

/// Prints the forecast path and, when present, the simulated one.
pub fn print_table_path(
    forecast: &ForecastPath,
    bootstrap: Option<&BootstrapForecast>,
    format: OutputFormat,
) -> Result<()> {
    let confidence = (1.0 - forecast.significance) * 100.0;
    let rows: Vec<ForecastRow> = forecast.steps.iter().map(ForecastRow::from).collect();
    print_header(&format!(
        "{confidence:.1}% VaR / ES Forecast (losses in %, from day {})",
        forecast.origin
    ));
    print_output(&rows, format)?;

    if let Some(bootstrap) = bootstrap {
        let rows: Vec<BootstrapRow> = bootstrap.steps.iter().map(BootstrapRow::from).collect();
        print_header(&format!(
            "Filtered Historical Simulation ({} paths, seed {})",
            bootstrap.simulations, bootstrap.seed
        ));
        print_output(&rows, format)?;
    }
    Ok(())
}
