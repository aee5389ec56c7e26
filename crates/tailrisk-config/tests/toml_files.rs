//! TOML load/save through the filesystem.

use std::io::Write;

use tailrisk_config::{ConfigError, PipelineConfig, Validate, WindowKind};
use tailrisk_core::DistributionFamily;

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");

    let mut config = PipelineConfig::default()
        .with_significance(0.025)
        .with_families(vec![DistributionFamily::SkewStudentT])
        .with_max_orders(1, 0, 1, 1)
        .with_risk_free_rate(0.03);
    config.backtest.window = WindowKind::Expanding;
    config.bootstrap.seed = 7;

    config.save(&path).unwrap();
    let loaded = PipelineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[selection]
families = ["ged", "skew_ged"]
max_q = 0

[backtest]
refit_every = 50
"#
    )
    .unwrap();

    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(
        config.selection.families,
        vec![DistributionFamily::Ged, DistributionFamily::SkewGed]
    );
    assert_eq!(config.selection.max_q, 0);
    assert_eq!(config.selection.max_p, 2);
    assert_eq!(config.backtest.refit_every, 50);
    assert_eq!(config.forecast.horizon, 10);
    assert_eq!(config.data.price_column, "adjusted_close");
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let result = PipelineConfig::from_toml_str(
        r#"
[forecast]
significance = 0.0
horizon = 0
"#,
    );
    match result {
        Err(ConfigError::MultipleValidationErrors(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_malformed_toml() {
    assert!(matches!(
        PipelineConfig::from_toml_str("[forecast\nsignificance = "),
        Err(ConfigError::Deserialization(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        PipelineConfig::load("/definitely/not/here.toml"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_read_defers_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[tail]\nmin_exceedances = 1").unwrap();

    let config = PipelineConfig::read(file.path()).unwrap();
    let errors = config.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "tail.min_exceedances");
    assert!(PipelineConfig::load(file.path()).is_err());
}
