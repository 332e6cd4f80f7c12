//! Integration tests for CLI config parsing and util helpers.

use fplearn_classifiers::config::PipelineConfig;
use fplearn_classifiers::error::PipelineError;
use fplearn_cli::predict::input::PredictConfig;
use fplearn_cli::util::validate_csv_file;

// ---------------------------------------------------------------------------
// validate_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_csv_file("/nonexistent/path/data.csv").is_err());
}

// ---------------------------------------------------------------------------
// PipelineConfig defaults & validation
// ---------------------------------------------------------------------------

#[test]
fn pipeline_config_default_values() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.fingerprint_size, 2048);
    assert_eq!(cfg.encoding_dim, 256);
    assert_eq!(cfg.epochs, 512);
    assert_eq!(cfg.k_folds, 5);
    assert!((cfg.test_fraction - 0.2).abs() < 1e-6);
    assert!(cfg.compress);
    assert!(!cfg.overwrite);
}

#[test]
fn pipeline_config_serializes_and_round_trips() {
    let cfg = PipelineConfig::default();
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(json.contains("fingerprint_size"));
    assert!(json.contains("k_folds"));
    let cfg2: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg.fingerprint_size, cfg2.fingerprint_size);
    assert_eq!(cfg.k_folds, cfg2.k_folds);
}

#[test]
fn pipeline_config_partial_json_uses_defaults() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{"input_file": "data.csv", "k_folds": 3}"#).unwrap();
    assert_eq!(cfg.input_file, "data.csv");
    assert_eq!(cfg.k_folds, 3);
    assert_eq!(cfg.fingerprint_size, 2048);
}

fn valid_config() -> PipelineConfig {
    PipelineConfig {
        input_file: "data.csv".to_string(),
        ..Default::default()
    }
}

#[test]
fn validate_accepts_default_combination() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn validate_rejects_encoding_dim_at_or_above_fingerprint_size() {
    let mut cfg = valid_config();
    cfg.fingerprint_size = 256;
    cfg.encoding_dim = 256;
    assert!(matches!(
        cfg.validate(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn validate_rejects_zero_epochs() {
    let mut cfg = valid_config();
    cfg.epochs = 0;
    assert!(matches!(
        cfg.validate(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn validate_rejects_single_fold() {
    let mut cfg = valid_config();
    cfg.k_folds = 1;
    assert!(matches!(
        cfg.validate(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn validate_rejects_out_of_range_test_fraction() {
    let mut cfg = valid_config();
    cfg.test_fraction = 1.0;
    assert!(matches!(
        cfg.validate(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn validate_rejects_unknown_input_type() {
    let mut cfg = valid_config();
    cfg.input_type = "inchi".to_string();
    assert!(matches!(
        cfg.validate(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn validate_ignores_encoding_dim_when_compression_disabled() {
    let mut cfg = valid_config();
    cfg.compress = false;
    cfg.fingerprint_size = 128;
    cfg.encoding_dim = 512;
    assert!(cfg.validate().is_ok());
}

// ---------------------------------------------------------------------------
// PredictConfig defaults & serialization
// ---------------------------------------------------------------------------

#[test]
fn predict_config_default_values() {
    let cfg = PredictConfig::default();
    assert_eq!(cfg.output_file, "predictions.csv");
    assert_eq!(cfg.input_type, "smiles");
    assert_eq!(cfg.fingerprint_size, 2048);
    assert!(cfg.compressor_file.is_none());
}

#[test]
fn predict_config_round_trips_json() {
    let cfg = PredictConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let cfg2: PredictConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg.output_file, cfg2.output_file);
    assert_eq!(cfg.fingerprint_size, cfg2.fingerprint_size);
}
