//! Config command implementation.
//!
//! Shows, writes and validates pipeline configuration files.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use tailrisk_config::{PipelineConfig, Validate};

use crate::cli::OutputFormat;
use crate::output::{print_error, print_header, print_json, print_output, print_success, KeyValue};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration (file, then `--set` overrides)
    Show,

    /// Write the effective configuration as a TOML file
    Init(InitArgs),

    /// Check the effective configuration and report every problem
    Validate,
}

/// Arguments for init subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination file
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute the config command.
pub fn execute(
    args: ConfigArgs,
    config: PipelineConfig,
    source: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    match args.command {
        ConfigCommand::Show => execute_show(&config, format),
        ConfigCommand::Init(init_args) => execute_init(&config, init_args),
        ConfigCommand::Validate => execute_validate(&config, source),
    }
}

/// Flattens nested sections into `section.key` pairs.
fn flatten(prefix: &str, value: &Value, out: &mut Vec<KeyValue>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        Value::String(s) => out.push(KeyValue::new(prefix, s.clone())),
        other => out.push(KeyValue::new(prefix, other.to_string())),
    }
}

fn config_rows(config: &PipelineConfig) -> Result<Vec<KeyValue>> {
    let mut rows = Vec::new();
    flatten("", &serde_json::to_value(config)?, &mut rows);
    Ok(rows)
}

/// Show the effective configuration.
fn execute_show(config: &PipelineConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_header("Pipeline Configuration");
            print_output(&config_rows(config)?, format)?;
        }
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Csv => print_output(&config_rows(config)?, format)?,
        OutputFormat::Minimal => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

/// Write the effective configuration to a file.
fn execute_init(config: &PipelineConfig, args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            args.path.display()
        );
    }
    config.save(&args.path)?;
    print_success(&format!("Wrote configuration to {}", args.path.display()));
    Ok(())
}

/// Validate the effective configuration.
fn execute_validate(config: &PipelineConfig, source: Option<PathBuf>) -> Result<()> {
    let name = source.map_or_else(|| "default configuration".to_string(), |p| p.display().to_string());
    let errors = config.validate();
    if errors.is_empty() {
        print_success(&format!("{name} is valid"));
        return Ok(());
    }
    for error in &errors {
        print_error(&error.to_string());
    }
    bail!("{name} has {} invalid value(s)", errors.len())
}
