use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PipelineError;

/// Central configuration for classifier models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelConfig {
    pub learning_rate: f64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported classifier families and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum ModelType {
    Feedforward {
        /// Hidden layer widths; empty derives them from the input width
        /// (half, then a quarter of the input).
        hidden_dims: Vec<usize>,
        dropout: f32,
        batch_size: usize,
        epochs: usize,
        early_stopping_patience: usize,
        seed: u64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Feedforward {
            hidden_dims: Vec::new(),
            dropout: 0.2,
            batch_size: 128,
            epochs: 512,
            early_stopping_patience: 20,
            seed: 42,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feedforward" | "fnn" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f64, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            model_type: ModelType::default(),
        }
    }
}

/// Immutable configuration for one full training run.
///
/// Loaded once (JSON file plus CLI overrides) and passed by reference into
/// every pipeline stage; there are no process-wide defaults beyond the
/// constants in `Default`.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_file: String,
    pub output_dir: String,
    /// "smiles" hashes structure strings; "bits" parses 0/1 strings.
    pub input_type: String,
    pub fingerprint_size: usize,
    pub encoding_dim: usize,
    pub epochs: usize,
    pub test_fraction: f32,
    pub k_folds: usize,
    /// Train classifiers on compressed features in addition to raw ones.
    pub compress: bool,
    /// Reuse previously trained compressor weights instead of retraining.
    pub compressor_file: Option<String>,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub early_stopping_patience: usize,
    pub seed: u64,
    pub overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_file: String::new(),
            output_dir: String::from("modeltraining"),
            input_type: String::from("smiles"),
            fingerprint_size: 2048,
            encoding_dim: 256,
            epochs: 512,
            test_fraction: 0.2,
            k_folds: 5,
            compress: true,
            compressor_file: None,
            batch_size: 128,
            learning_rate: 1e-3,
            early_stopping_patience: 20,
            seed: 42,
            overwrite: false,
        }
    }
}

impl PipelineConfig {
    /// Reject invalid parameter combinations before any computation starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.input_file.is_empty() {
            return Err(PipelineError::Configuration(
                "input_file must be set".to_string(),
            ));
        }
        if self.fingerprint_size == 0 {
            return Err(PipelineError::Configuration(
                "fingerprint_size must be positive".to_string(),
            ));
        }
        if self.compress && self.encoding_dim >= self.fingerprint_size {
            return Err(PipelineError::Configuration(format!(
                "encoding_dim ({}) must be smaller than fingerprint_size ({})",
                self.encoding_dim, self.fingerprint_size
            )));
        }
        if self.epochs == 0 {
            return Err(PipelineError::Configuration(
                "epochs must be positive".to_string(),
            ));
        }
        if self.k_folds < 2 {
            return Err(PipelineError::Configuration(format!(
                "k_folds must be at least 2, got {}",
                self.k_folds
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        match self.input_type.as_str() {
            "smiles" | "bits" => {}
            other => {
                return Err(PipelineError::Configuration(format!(
                    "input_type must be 'smiles' or 'bits', got '{}'",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Classifier hyper-parameters derived from the run configuration.
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            learning_rate: self.learning_rate,
            model_type: ModelType::Feedforward {
                hidden_dims: Vec::new(),
                dropout: 0.2,
                batch_size: self.batch_size,
                epochs: self.epochs,
                early_stopping_patience: self.early_stopping_patience,
                seed: self.seed,
            },
        }
    }
}
