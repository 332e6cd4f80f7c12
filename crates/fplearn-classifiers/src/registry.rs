//! Persistence of trained model artifacts.
//!
//! Every artifact is a safetensors weight file plus a JSON metadata
//! sidecar describing dimensions, provenance and scores. Both files are
//! written to temporary paths and renamed into place on completion, so an
//! interrupted run never leaves a valid-looking partial artifact. An
//! existing artifact is a persistence error unless overwrite was requested.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::data_handling::Representation;
use crate::error::PipelineError;
use crate::models::fnn::FnnClassifier;
use crate::stats::MetricSummary;
use crate::trainer::TrainedClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Classifier,
    Compressor,
}

/// Sidecar metadata persisted next to every weight file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub kind: ArtifactKind,
    pub label: Option<String>,
    pub representation: Option<Representation>,
    pub input_dim: usize,
    pub output_dim: usize,
    pub hidden_dims: Vec<usize>,
    pub run_id: String,
    pub created: String,
    pub metrics: Option<MetricSummary>,
}

impl ArtifactMetadata {
    pub fn expect_kind(&self, kind: ArtifactKind) -> Result<(), PipelineError> {
        if self.kind != kind {
            return Err(PipelineError::CorruptArtifact(format!(
                "expected a {:?} artifact, found {:?}",
                kind, self.kind
            )));
        }
        Ok(())
    }

    pub fn expect_input_dim(&self, input_dim: usize) -> Result<(), PipelineError> {
        if self.input_dim != input_dim {
            return Err(PipelineError::CorruptArtifact(format!(
                "artifact expects input width {}, got {}",
                self.input_dim, input_dim
            )));
        }
        Ok(())
    }
}

/// Writes and reloads model artifacts within one output directory.
pub struct ModelRegistry {
    directory: PathBuf,
    run_id: String,
    overwrite: bool,
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

impl ModelRegistry {
    pub fn new(
        directory: impl Into<PathBuf>,
        run_id: impl Into<String>,
        overwrite: bool,
    ) -> Result<Self, PipelineError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| {
            PipelineError::Persistence(format!(
                "failed to create artifact directory {}: {}",
                directory.display(),
                e
            ))
        })?;
        Ok(ModelRegistry {
            directory,
            run_id: run_id.into(),
            overwrite,
        })
    }

    /// Timestamp-based run identifier used in artifact file names.
    pub fn generate_run_id() -> String {
        chrono::Local::now().format("%Y-%m-%d_%H%M%S").to_string()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn classifier_path(&self, label: &str, representation: Representation) -> PathBuf {
        self.directory.join(format!(
            "{}.{}.{}.safetensors",
            sanitize(label),
            representation,
            self.run_id
        ))
    }

    pub fn compressor_path(&self) -> PathBuf {
        self.directory
            .join(format!("compressor.{}.safetensors", self.run_id))
    }

    fn metadata_path(weights_path: &Path) -> PathBuf {
        weights_path.with_extension("json")
    }

    fn tmp_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }

    /// Write an artifact: collision check, temp files, atomic rename.
    pub fn persist<F>(
        &self,
        weights_path: PathBuf,
        meta: &ArtifactMetadata,
        write_weights: F,
    ) -> Result<PathBuf, PipelineError>
    where
        F: FnOnce(&Path) -> Result<(), PipelineError>,
    {
        let meta_path = Self::metadata_path(&weights_path);
        if !self.overwrite && (weights_path.exists() || meta_path.exists()) {
            return Err(PipelineError::Persistence(format!(
                "artifact already exists: {} (pass overwrite to replace it)",
                weights_path.display()
            )));
        }

        let tmp_weights = Self::tmp_path(&weights_path);
        let tmp_meta = Self::tmp_path(&meta_path);
        let result = (|| {
            write_weights(&tmp_weights)?;
            let json = serde_json::to_string_pretty(meta)
                .map_err(|e| PipelineError::Persistence(e.to_string()))?;
            fs::write(&tmp_meta, json)
                .map_err(|e| PipelineError::Persistence(e.to_string()))?;
            fs::rename(&tmp_weights, &weights_path)
                .map_err(|e| PipelineError::Persistence(e.to_string()))?;
            fs::rename(&tmp_meta, &meta_path)
                .map_err(|e| PipelineError::Persistence(e.to_string()))?;
            Ok(weights_path.clone())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_weights);
            let _ = fs::remove_file(&tmp_meta);
        }
        result
    }

    /// Persist a fitted classifier and its metadata.
    pub fn save_classifier(
        &self,
        classifier: &TrainedClassifier,
        input_dim: usize,
    ) -> Result<PathBuf, PipelineError> {
        let weights_path = self.classifier_path(&classifier.label, classifier.representation);
        let meta = ArtifactMetadata {
            kind: ArtifactKind::Classifier,
            label: Some(classifier.label.clone()),
            representation: Some(classifier.representation),
            input_dim,
            output_dim: 1,
            hidden_dims: classifier.model.hidden_dims(),
            run_id: self.run_id.clone(),
            created: chrono::Local::now().to_rfc3339(),
            metrics: Some(classifier.metrics.mean),
        };
        let path = self.persist(weights_path, &meta, |tmp| classifier.model.save(tmp))?;
        log::info!(
            "Saved classifier for label '{}' ({}) to {}",
            classifier.label,
            classifier.representation,
            path.display()
        );
        Ok(path)
    }

    /// Persist compressor weights written by `write_weights`.
    pub fn save_compressor<F>(
        &self,
        input_dim: usize,
        encoding_dim: usize,
        write_weights: F,
    ) -> Result<PathBuf, PipelineError>
    where
        F: FnOnce(&Path) -> Result<(), PipelineError>,
    {
        let weights_path = self.compressor_path();
        let meta = ArtifactMetadata {
            kind: ArtifactKind::Compressor,
            label: None,
            representation: None,
            input_dim,
            output_dim: encoding_dim,
            hidden_dims: Vec::new(),
            run_id: self.run_id.clone(),
            created: chrono::Local::now().to_rfc3339(),
            metrics: None,
        };
        let path = self.persist(weights_path, &meta, write_weights)?;
        log::info!("Saved compressor weights to {}", path.display());
        Ok(path)
    }

    /// Reload a persisted classifier together with its metadata.
    ///
    /// The network is rebuilt from the metadata dimensions before the
    /// weights are loaded, so a dimension mismatch between sidecar and
    /// weight file surfaces as a corrupt-artifact error.
    pub fn load_classifier(
        weights_path: &Path,
    ) -> Result<(FnnClassifier, ArtifactMetadata), PipelineError> {
        let meta = Self::load_metadata(weights_path)?;
        meta.expect_kind(ArtifactKind::Classifier)?;
        let classifier = FnnClassifier::load(
            weights_path,
            meta.input_dim,
            meta.hidden_dims.clone(),
            ModelConfig::default(),
        )?;
        Ok((classifier, meta))
    }

    /// Read and parse the metadata sidecar for a weight file.
    pub fn load_metadata(weights_path: &Path) -> Result<ArtifactMetadata, PipelineError> {
        let meta_path = Self::metadata_path(weights_path);
        let content = fs::read_to_string(&meta_path).map_err(|e| {
            PipelineError::CorruptArtifact(format!(
                "missing or unreadable metadata {}: {}",
                meta_path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PipelineError::CorruptArtifact(format!(
                "unparseable metadata {}: {}",
                meta_path.display(),
                e
            ))
        })
    }
}
