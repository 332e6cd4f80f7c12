//! End-to-end pipeline test on a tiny synthetic compound table: train the
//! compressor and classifiers, then reload the artifacts for prediction.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use fplearn_classifiers::config::PipelineConfig;
use fplearn_cli::predict::input::PredictConfig;
use fplearn_cli::predict::predict::run_prediction;
use fplearn_cli::train::trainer::run_training;

/// 24 molecules: label "tox" is balanced 12/12; label "rare" has a single
/// positive and must be skipped by the fold splitter.
fn write_compound_csv(path: &PathBuf) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "id,smiles,tox,rare").unwrap();
    for i in 0..24 {
        let tox = i % 2;
        let rare = if i == 0 { "1" } else { "0" };
        // Distinct structure strings; tox-positive molecules share a motif.
        let smiles = if tox == 1 {
            format!("C(=O)N{}CC", "C".repeat(i + 1))
        } else {
            format!("c1ccccc1{}O", "N".repeat(i + 1))
        };
        writeln!(file, "m{},{},{},{}", i, smiles, tox, rare).unwrap();
    }
}

fn tiny_pipeline_config(input: &PathBuf, output_dir: &PathBuf) -> PipelineConfig {
    PipelineConfig {
        input_file: input.to_string_lossy().to_string(),
        output_dir: output_dir.to_string_lossy().to_string(),
        input_type: "smiles".to_string(),
        fingerprint_size: 32,
        encoding_dim: 8,
        epochs: 3,
        test_fraction: 0.25,
        k_folds: 2,
        compress: true,
        compressor_file: None,
        batch_size: 8,
        learning_rate: 1e-3,
        early_stopping_patience: 5,
        seed: 42,
        overwrite: false,
    }
}

#[test]
fn train_then_predict_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("compounds.csv");
    let output_dir = dir.path().join("out");
    write_compound_csv(&input);

    let config = tiny_pipeline_config(&input, &output_dir);
    run_training(&config).unwrap();

    // Artifacts: compressor, tox classifiers for both representations,
    // metrics report, summary and config echo.
    let names: Vec<String> = fs::read_dir(&output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert!(
        names.iter().any(|n| n.starts_with("compressor.") && n.ends_with(".safetensors")),
        "missing compressor artifact in {:?}",
        names
    );
    assert!(names.iter().any(|n| n.starts_with("tox.raw.") && n.ends_with(".safetensors")));
    assert!(names
        .iter()
        .any(|n| n.starts_with("tox.compressed.") && n.ends_with(".safetensors")));
    assert!(names.iter().any(|n| n.starts_with("metrics.")));
    assert!(names.iter().any(|n| n.starts_with("summary.")));
    assert!(names.iter().any(|n| n.starts_with("config.")));
    assert!(
        !names.iter().any(|n| n.ends_with(".tmp")),
        "temporary files left behind: {:?}",
        names
    );

    // The run summary records the trained label and the skipped one.
    let summary_name = names.iter().find(|n| n.starts_with("summary.")).unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join(summary_name)).unwrap()).unwrap();
    let succeeded = summary["succeeded"].as_array().unwrap();
    assert_eq!(succeeded.len(), 1);
    assert_eq!(succeeded[0]["label"], "tox");
    let skipped = summary["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["label"], "rare");

    // Predict with the raw-representation classifier.
    let raw_classifier = names
        .iter()
        .find(|n| n.starts_with("tox.raw.") && n.ends_with(".safetensors"))
        .unwrap();
    let predictions_path = dir.path().join("predictions.csv");
    let predict_config = PredictConfig {
        input_file: input.to_string_lossy().to_string(),
        output_file: predictions_path.to_string_lossy().to_string(),
        classifier_file: output_dir.join(raw_classifier).to_string_lossy().to_string(),
        compressor_file: None,
        input_type: "smiles".to_string(),
        fingerprint_size: 32,
    };
    run_prediction(&predict_config).unwrap();

    let predictions = fs::read_to_string(&predictions_path).unwrap();
    let lines: Vec<&str> = predictions.lines().collect();
    assert_eq!(lines.len(), 25, "header plus one row per molecule");
    assert!(lines[0].contains("tox_probability"));

    // Predict with the compressed-representation classifier, which needs
    // the compressor weights.
    let compressed_classifier = names
        .iter()
        .find(|n| n.starts_with("tox.compressed.") && n.ends_with(".safetensors"))
        .unwrap();
    let compressor = names
        .iter()
        .find(|n| n.starts_with("compressor.") && n.ends_with(".safetensors"))
        .unwrap();
    let compressed_predictions = dir.path().join("predictions_compressed.csv");
    let predict_config = PredictConfig {
        input_file: input.to_string_lossy().to_string(),
        output_file: compressed_predictions.to_string_lossy().to_string(),
        classifier_file: output_dir
            .join(compressed_classifier)
            .to_string_lossy()
            .to_string(),
        compressor_file: Some(output_dir.join(compressor).to_string_lossy().to_string()),
        input_type: "smiles".to_string(),
        fingerprint_size: 32,
    };
    run_prediction(&predict_config).unwrap();
    let predictions = fs::read_to_string(&compressed_predictions).unwrap();
    assert_eq!(predictions.lines().count(), 25);

    // A compressed classifier without the compressor is an error.
    let predict_config = PredictConfig {
        compressor_file: None,
        output_file: dir
            .path()
            .join("predictions_missing.csv")
            .to_string_lossy()
            .to_string(),
        classifier_file: output_dir
            .join(compressed_classifier)
            .to_string_lossy()
            .to_string(),
        input_file: input.to_string_lossy().to_string(),
        input_type: "smiles".to_string(),
        fingerprint_size: 32,
    };
    assert!(run_prediction(&predict_config).is_err());
}

#[test]
fn training_without_compression_skips_compressor() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("compounds.csv");
    let output_dir = dir.path().join("out");
    write_compound_csv(&input);

    let mut config = tiny_pipeline_config(&input, &output_dir);
    config.compress = false;
    run_training(&config).unwrap();

    let names: Vec<String> = fs::read_dir(&output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert!(!names.iter().any(|n| n.starts_with("compressor.")));
    assert!(names.iter().any(|n| n.starts_with("tox.raw.")));
    assert!(!names.iter().any(|n| n.starts_with("tox.compressed.")));
}

#[test]
fn invalid_configuration_aborts_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("compounds.csv");
    let output_dir = dir.path().join("out");
    write_compound_csv(&input);

    let mut config = tiny_pipeline_config(&input, &output_dir);
    config.encoding_dim = 32; // equal to fingerprint_size
    assert!(run_training(&config).is_err());
    assert!(!output_dir.exists(), "no output may exist after a config error");
}
