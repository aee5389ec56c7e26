//! Command-line style `section.key=value` overrides.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::PipelineConfig;

/// A single field override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverride {
    /// Dotted path, e.g. `forecast.significance`.
    pub field_path: String,
    /// Replacement value.
    pub value: Value,
}

impl ConfigOverride {
    /// Creates an override.
    pub fn new(field_path: impl Into<String>, value: Value) -> Self {
        Self {
            field_path: field_path.into(),
            value,
        }
    }
}

impl FromStr for ConfigOverride {
    type Err = ConfigError;

    /// Parses `path=value`. The value is read as JSON when possible
    /// (`0.05`, `true`, `["normal"]`) and as a bare string otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, raw) = s.split_once('=').ok_or_else(|| ConfigError::InvalidOverride {
            field: s.to_string(),
        })?;
        let path = path.trim();
        if path.is_empty() {
            return Err(ConfigError::InvalidOverride {
                field: s.to_string(),
            });
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self::new(path, value))
    }
}

impl PipelineConfig {
    /// Returns a copy with `overrides` applied in order.
    ///
    /// # Errors
    ///
    /// Fails when a path does not name an existing field or the new value
    /// has the wrong type.
    pub fn with_overrides(&self, overrides: &[ConfigOverride]) -> ConfigResult<Self> {
        let mut json = serde_json::to_value(self)?;
        for item in overrides {
            apply_json_override(&mut json, &item.field_path, &item.value)?;
        }
        Ok(serde_json::from_value(json)?)
    }
}

fn apply_json_override(target: &mut Value, path: &str, value: &Value) -> ConfigResult<()> {
    let invalid = || ConfigError::InvalidOverride {
        field: path.to_string(),
    };
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = target;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        current = current.get_mut(part).ok_or_else(invalid)?;
    }

    let object = current.as_object_mut().ok_or_else(invalid)?;
    match object.get_mut(leaf) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::WindowKind;
    use tailrisk_core::DistributionFamily;

    #[test]
    fn test_parse_override() {
        let o: ConfigOverride = "forecast.significance=0.05".parse().unwrap();
        assert_eq!(o.field_path, "forecast.significance");
        assert_eq!(o.value, serde_json::json!(0.05));

        let o: ConfigOverride = "backtest.window = expanding".parse().unwrap();
        assert_eq!(o.value, Value::String("expanding".into()));

        assert!("no_equals_sign".parse::<ConfigOverride>().is_err());
        assert!("=1".parse::<ConfigOverride>().is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let overrides: Vec<ConfigOverride> = [
            "forecast.significance=0.05",
            "backtest.window=expanding",
            r#"selection.families=["normal","student_t"]"#,
            "bootstrap.enabled=false",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

        let config = PipelineConfig::default().with_overrides(&overrides).unwrap();
        assert_eq!(config.forecast.significance, 0.05);
        assert_eq!(config.backtest.window, WindowKind::Expanding);
        assert_eq!(
            config.selection.families,
            vec![DistributionFamily::Normal, DistributionFamily::StudentT]
        );
        assert!(!config.bootstrap.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let o: ConfigOverride = "forecast.confidence=0.99".parse().unwrap();
        assert!(matches!(
            PipelineConfig::default().with_overrides(&[o]),
            Err(ConfigError::InvalidOverride { .. })
        ));

        let o: ConfigOverride = "nosuch.section=1".parse().unwrap();
        assert!(PipelineConfig::default().with_overrides(&[o]).is_err());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let o: ConfigOverride = "forecast.horizon=ten".parse().unwrap();
        assert!(matches!(
            PipelineConfig::default().with_overrides(&[o]),
            Err(ConfigError::Deserialization(_))
        ));
    }
}
