mod common;

use common::*;
use fumarole_localization::{ConfigError, DetectorSettings, EvaluationSettings};
use std::io::Write;

#[test]
fn test_sample_config_builds_everything() {
    let config = Config::sample().unwrap();

    assert!(FumaroleDetector::from_config(&config).is_ok());
    assert!(AlgorithmEvaluator::from_config(&config).is_ok());
    assert_eq!(config.get_str("pipeline.heat_threshold.bins").unwrap(), "150 200 230");
}

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(TEST_CONFIG.as_bytes())?;

    let config = Config::load(file.path())?;

    assert_eq!(config.get_int("evaluation.detection.threshold_max")?, 25);

    Ok(())
}

#[test]
fn test_missing_file() {
    let err = Config::load(std::path::Path::new("/nonexistent/fumaroles.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_parse_error() {
    let err = Config::from_toml_str("[detection\nmin_area = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_key() {
    let config = Config::from_toml_str("[detection]\nmin_area_heated_area = 1.0\n").unwrap();

    let err = DetectorSettings::from_config(&config).unwrap_err();
    assert!(
        matches!(err, ConfigError::MissingKey(ref key) if key == "detection.open_vent_radius_search")
    );
}

#[test]
fn test_wrong_type() {
    let config = Config::from_toml_str("[a]\nb = \"text\"\nc = 1.5\n").unwrap();

    assert!(matches!(config.get_float("a.b"), Err(ConfigError::WrongType { .. })));
    assert!(matches!(config.get_int("a.c"), Err(ConfigError::WrongType { .. })));
    assert!(matches!(config.get_str("a.c"), Err(ConfigError::WrongType { .. })));
}

#[test]
fn test_integers_widen_to_float() {
    let settings = DetectorSettings::from_config(&test_config()).unwrap();

    assert_eq!(settings.hidden_vent_radius, 40.0);
    assert_eq!(settings.open_vent_radius, 20.0);
    assert_eq!(settings.min_area_heated_area, 100.0);
}

#[test]
fn test_evaluation_settings_are_validated() {
    let valid = EvaluationSettings::from_config(&test_config()).unwrap();
    assert_eq!(valid.detection_thresholds(), vec![5, 15, 25]);

    let zero_step = EvaluationSettings {
        detection_threshold_step: 0,
        ..valid
    };
    assert!(matches!(zero_step.validate(), Err(ConfigError::Invalid { .. })));

    let reversed = EvaluationSettings {
        detection_threshold_min: 30,
        ..valid
    };
    assert!(reversed.validate().is_err());

    let bad_iou = EvaluationSettings {
        iou_threshold_step: 1.5,
        ..valid
    };
    assert!(bad_iou.validate().is_err());
}

#[test]
fn test_negative_threshold_rejected() {
    let text = TEST_CONFIG.replace("threshold_min = 5", "threshold_min = -5");
    let config = Config::from_toml_str(&text).unwrap();

    assert!(matches!(
        EvaluationSettings::from_config(&config),
        Err(ConfigError::Invalid { .. })
    ));
}
