//! # tailrisk-config
//!
//! Configuration for the tailrisk pipeline.
//!
//! - **[`PipelineConfig`]**: one section per stage (data, selection,
//!   estimation, tail, forecast, backtest, bootstrap, diagnostics), each
//!   with serde defaults
//! - **Validation**: the [`Validate`] trait collects every problem instead of
//!   stopping at the first
//! - **Files**: TOML load and save
//! - **Overrides**: `section.key=value` strings applied on top of a file
//!
//! # Example
//!
//! ```rust
//! use tailrisk_config::{PipelineConfig, Validate};
//!
//! let config = PipelineConfig::from_toml_str(
//!     r#"
//!     [forecast]
//!     significance = 0.05
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.forecast.significance, 0.05);
//! assert_eq!(config.tail.min_exceedances, 20);
//! assert!(config.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod overrides;
mod pipeline;

use std::path::Path;

pub use error::{ConfigError, ConfigResult, Validate, ValidationError};
pub use overrides::ConfigOverride;
pub use pipeline::{
    BacktestConfig, BootstrapConfig, DataConfig, DiagnosticsConfig, EstimationConfig,
    ForecastConfig, PipelineConfig, SelectionConfig, TailConfig, WindowKind,
};

impl PipelineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialization`] for malformed TOML and a
    /// validation error for out-of-range values.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config = Self::parse_toml(s)?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Parses a TOML document without validating it, so that overrides
    /// can be applied before [`Validate::validate`] reports every problem.
    pub fn parse_toml(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a TOML file without validating it.
    pub fn read(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_toml(&text)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// as [`PipelineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult, Validate, ValidationError};
    pub use crate::overrides::ConfigOverride;
    pub use crate::pipeline::{PipelineConfig, WindowKind};
}
