//! CLI command implementations.

pub mod backtest;
pub mod config;
pub mod fit;
pub mod forecast;
pub mod report;
pub mod returns;
pub mod select;

pub use backtest::BacktestArgs;
pub use config::ConfigArgs;
pub use fit::FitArgs;
pub use forecast::ForecastArgs;
pub use report::ReportArgs;
pub use returns::ReturnsArgs;
pub use select::SelectArgs;

use std::path::{Path, PathBuf};

use clap::Args;
use tailrisk_config::PipelineConfig;
use tailrisk_core::{DistributionFamily, ModelSpec, PriceSeries, ReturnSeries};
use tailrisk_models::FittedModel;
use tailrisk_risk::{Pipeline, PipelineError};

use crate::error::{CliError, CliResult};

/// Price input shared by every pipeline command.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// CSV file with a `date` column (YYYY-MM-DD) and a price column
    #[arg(short, long)]
    pub input: PathBuf,

    /// Price column name [default: adjusted_close]
    #[arg(long)]
    pub column: Option<String>,

    /// Annualized risk-free rate as a decimal, e.g. 0.02
    #[arg(long)]
    pub risk_free_rate: Option<f64>,
}

impl DataArgs {
    /// Writes the flags that were given into `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(column) = &self.column {
            config.data.price_column.clone_from(column);
        }
        if let Some(rate) = self.risk_free_rate {
            config.data.risk_free_rate = rate;
        }
    }
}

/// Reads prices and builds the percentage log-return series.
pub fn load_returns(input: &Path, config: &PipelineConfig) -> CliResult<ReturnSeries> {
    let prices = PriceSeries::from_csv_path(input, &config.data.price_column)?;
    let returns = ReturnSeries::from_price_series(&prices, config.data.risk_free_rate)?;
    tracing::info!(observations = returns.len(), "built return series");
    Ok(returns)
}

/// Maximum ARMA-GARCH orders for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orders {
    pub p: usize,
    pub q: usize,
    pub r: usize,
    pub s: usize,
}

fn parse_usizes(s: &str) -> Option<Vec<usize>> {
    s.split(',').map(|part| part.trim().parse().ok()).collect()
}

/// Parses `p,q,r,s`.
pub fn parse_orders(s: &str) -> CliResult<Orders> {
    match parse_usizes(s).as_deref() {
        Some(&[p, q, r, s]) => Ok(Orders { p, q, r, s }),
        _ => Err(CliError::InvalidOrders(s.to_string())),
    }
}

/// Parses `p,q,r,s,family`, e.g. `1,0,1,1,sstd`.
pub fn parse_spec(s: &str) -> CliResult<ModelSpec> {
    let invalid = || CliError::InvalidSpec(s.to_string());
    let (orders, family) = s.rsplit_once(',').ok_or_else(invalid)?;
    let family: DistributionFamily = family.parse().map_err(|_| invalid())?;
    let orders = parse_orders(orders).map_err(|_| invalid())?;
    Ok(ModelSpec::new(orders.p, orders.q, orders.r, orders.s, family))
}

/// Model choice: a fixed specification, or selection over a search space.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Fixed specification `p,q,r,s,family`; selected by AICC when omitted
    #[arg(short, long, value_parser = parse_spec)]
    pub spec: Option<ModelSpec>,

    /// Candidate families for selection, comma separated (norm,std,ged,snorm,sstd,sged)
    #[arg(long, value_delimiter = ',')]
    pub families: Vec<DistributionFamily>,

    /// Maximum orders `p,q,r,s` for selection
    #[arg(long, value_parser = parse_orders)]
    pub max_order: Option<Orders>,

    /// Do not estimate a constant mean
    #[arg(long)]
    pub zero_mean: bool,

    /// Fit selection candidates in parallel
    #[arg(long)]
    pub parallel: bool,
}

impl ModelArgs {
    /// Writes the selection flags that were given into `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        let selection = &mut config.selection;
        if !self.families.is_empty() {
            selection.families.clone_from(&self.families);
        }
        if let Some(o) = self.max_order {
            selection.max_p = o.p;
            selection.max_q = o.q;
            selection.max_r = o.r;
            selection.max_s = o.s;
        }
        if self.zero_mean {
            selection.include_mean = false;
        }
        if self.parallel {
            selection.parallel = true;
        }
    }

    /// The fixed specification, honoring the configured mean setting.
    pub fn spec(&self, config: &PipelineConfig) -> Option<ModelSpec> {
        self.spec.map(|spec| spec.with_mean(config.selection.include_mean))
    }
}

/// Fits the fixed specification, or selects one and re-estimates it.
pub fn fit_model(
    pipeline: &Pipeline,
    spec: Option<ModelSpec>,
    losses: &[f64],
) -> Result<FittedModel, PipelineError> {
    match spec {
        Some(spec) => pipeline.fit(&spec, losses),
        None => {
            let selection = pipeline.select(losses)?;
            tracing::info!(spec = %selection.spec(), "selected model");
            pipeline.estimate(&selection, losses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spec() {
        let spec = parse_spec("1, 0, 1, 1, sstd").unwrap();
        assert_eq!(
            spec,
            ModelSpec::new(1, 0, 1, 1, DistributionFamily::SkewStudentT)
        );
        assert!(parse_spec("1,0,1,std").is_err());
        assert!(parse_spec("1,0,1,1,cauchy").is_err());
        assert!(parse_spec("a,0,1,1,norm").is_err());
    }

    #[test]
    fn test_parse_orders() {
        assert_eq!(
            parse_orders("0,1,2,2").unwrap(),
            Orders { p: 0, q: 1, r: 2, s: 2 }
        );
        assert!(parse_orders("1,1,1").is_err());
        assert!(parse_orders("1,1,1,-1").is_err());
    }

    #[test]
    fn test_model_args_apply() {
        let args = ModelArgs {
            spec: Some(ModelSpec::new(0, 0, 1, 1, DistributionFamily::Normal)),
            families: vec![DistributionFamily::Ged],
            max_order: Some(Orders { p: 1, q: 0, r: 1, s: 1 }),
            zero_mean: true,
            parallel: false,
        };
        let mut config = PipelineConfig::default();
        args.apply(&mut config);

        assert_eq!(config.selection.families, vec![DistributionFamily::Ged]);
        assert_eq!(config.selection.max_q, 0);
        assert!(!config.selection.include_mean);
        assert!(!args.spec(&config).unwrap().include_mean);
    }
}
