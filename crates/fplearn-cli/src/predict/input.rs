use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use crate::util::validate_csv_file;

/// Configuration for prediction mode.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PredictConfig {
    pub input_file: String,
    pub output_file: String,
    /// Path to the classifier weights (*.safetensors, metadata alongside).
    pub classifier_file: String,
    /// Required when the classifier was trained on compressed features.
    pub compressor_file: Option<String>,
    pub input_type: String,
    pub fingerprint_size: usize,
}

impl Default for PredictConfig {
    fn default() -> Self {
        PredictConfig {
            input_file: String::new(),
            output_file: String::from("predictions.csv"),
            classifier_file: String::new(),
            compressor_file: None,
            input_type: String::from("smiles"),
            fingerprint_size: 2048,
        }
    }
}

/// Load the prediction configuration file and apply CLI overrides.
pub fn load_predict_config(config_path: &PathBuf, matches: &ArgMatches) -> Result<PredictConfig> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

    let mut config: PredictConfig = serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

    // Apply CLI overrides
    if let Some(input_file) = matches.get_one::<String>("input_file") {
        config.input_file = input_file.clone();
    }
    if let Some(output_file) = matches.get_one::<String>("output_file") {
        config.output_file = output_file.clone();
    }
    if let Some(classifier_file) = matches.get_one::<String>("classifier_file") {
        config.classifier_file = classifier_file.clone();
    }
    if let Some(compressor_file) = matches.get_one::<String>("compressor_file") {
        config.compressor_file = Some(compressor_file.clone());
    }

    validate_csv_file(&config.input_file)?;
    if config.classifier_file.is_empty() {
        anyhow::bail!("classifier_file must be set (config file or --model)");
    }

    Ok(config)
}
