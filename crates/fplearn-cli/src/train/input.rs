use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;

use fplearn_classifiers::config::PipelineConfig;

use crate::util::validate_csv_file;

/// Load the training configuration file and apply CLI overrides.
pub fn load_train_config(config_path: &PathBuf, matches: &ArgMatches) -> Result<PipelineConfig> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

    let mut config: PipelineConfig = serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

    // Apply CLI overrides
    if let Some(input_file) = matches.get_one::<String>("input_file") {
        config.input_file = input_file.clone();
    }
    if let Some(output_dir) = matches.get_one::<String>("output_dir") {
        config.output_dir = output_dir.clone();
    }
    if let Some(compressor_file) = matches.get_one::<String>("compressor_file") {
        config.compressor_file = Some(compressor_file.clone());
    }
    if matches.get_flag("no_compress") {
        config.compress = false;
    }
    if matches.get_flag("overwrite") {
        config.overwrite = true;
    }

    validate_csv_file(&config.input_file)?;
    config.validate()?;

    Ok(config)
}
