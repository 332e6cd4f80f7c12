//! Integration tests for artifact persistence: naming, collisions, atomic
//! writes and metadata verification.

use std::fs;

use fplearn_classifiers::data_handling::Representation;
use fplearn_classifiers::error::PipelineError;
use fplearn_classifiers::registry::{ArtifactKind, ArtifactMetadata, ModelRegistry};

fn compressor_meta(run_id: &str) -> ArtifactMetadata {
    ArtifactMetadata {
        kind: ArtifactKind::Compressor,
        label: None,
        representation: None,
        input_dim: 64,
        output_dim: 16,
        hidden_dims: Vec::new(),
        run_id: run_id.to_string(),
        created: "2024-01-01T00:00:00+00:00".to_string(),
        metrics: None,
    }
}

// ---------------------------------------------------------------------------
// persist / collision policy
// ---------------------------------------------------------------------------

#[test]
fn persist_writes_weights_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "run1", false).unwrap();

    let path = registry
        .persist(registry.compressor_path(), &compressor_meta("run1"), |tmp| {
            fs::write(tmp, b"weights").map_err(|e| PipelineError::Persistence(e.to_string()))
        })
        .unwrap();

    assert!(path.exists());
    assert!(path.with_extension("json").exists());
    // No temporary files survive a successful write.
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind");
}

#[test]
fn persist_collision_errors_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "run1", false).unwrap();
    let write = |tmp: &std::path::Path| {
        fs::write(tmp, b"weights").map_err(|e| PipelineError::Persistence(e.to_string()))
    };

    registry
        .persist(registry.compressor_path(), &compressor_meta("run1"), write)
        .unwrap();
    let second = registry.persist(registry.compressor_path(), &compressor_meta("run1"), write);
    assert!(matches!(second, Err(PipelineError::Persistence(_))));
}

#[test]
fn persist_collision_allowed_with_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "run1", true).unwrap();
    let write = |tmp: &std::path::Path| {
        fs::write(tmp, b"weights").map_err(|e| PipelineError::Persistence(e.to_string()))
    };

    registry
        .persist(registry.compressor_path(), &compressor_meta("run1"), write)
        .unwrap();
    registry
        .persist(registry.compressor_path(), &compressor_meta("run1"), write)
        .unwrap();
}

#[test]
fn persist_failed_write_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "run1", false).unwrap();

    let result = registry.persist(registry.compressor_path(), &compressor_meta("run1"), |_| {
        Err(PipelineError::Persistence("disk full".to_string()))
    });
    assert!(result.is_err());
    assert!(!registry.compressor_path().exists());
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(entries.is_empty(), "failed write must not leave files");
}

// ---------------------------------------------------------------------------
// naming
// ---------------------------------------------------------------------------

#[test]
fn classifier_path_encodes_label_representation_and_run() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "2024-01-01_120000", false).unwrap();
    let path = registry.classifier_path("Aromatase receptor", Representation::Compressed);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(
        name,
        "Aromatase_receptor.compressed.2024-01-01_120000.safetensors"
    );
}

// ---------------------------------------------------------------------------
// metadata loading / verification
// ---------------------------------------------------------------------------

#[test]
fn load_metadata_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(dir.path(), "run1", false).unwrap();
    let path = registry
        .persist(registry.compressor_path(), &compressor_meta("run1"), |tmp| {
            fs::write(tmp, b"weights").map_err(|e| PipelineError::Persistence(e.to_string()))
        })
        .unwrap();

    let meta = ModelRegistry::load_metadata(&path).unwrap();
    assert_eq!(meta.input_dim, 64);
    assert_eq!(meta.output_dim, 16);
    assert!(meta.expect_kind(ArtifactKind::Compressor).is_ok());
    assert!(meta.expect_input_dim(64).is_ok());
}

#[test]
fn load_metadata_missing_sidecar_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let weights = dir.path().join("orphan.safetensors");
    fs::write(&weights, b"weights").unwrap();
    let result = ModelRegistry::load_metadata(&weights);
    assert!(matches!(result, Err(PipelineError::CorruptArtifact(_))));
}

#[test]
fn load_metadata_unparseable_sidecar_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let weights = dir.path().join("model.safetensors");
    fs::write(&weights, b"weights").unwrap();
    fs::write(dir.path().join("model.json"), b"{ not json").unwrap();
    let result = ModelRegistry::load_metadata(&weights);
    assert!(matches!(result, Err(PipelineError::CorruptArtifact(_))));
}

#[test]
fn metadata_dimension_mismatch_is_corrupt() {
    let meta = compressor_meta("run1");
    assert!(matches!(
        meta.expect_input_dim(128),
        Err(PipelineError::CorruptArtifact(_))
    ));
    assert!(matches!(
        meta.expect_kind(ArtifactKind::Classifier),
        Err(PipelineError::CorruptArtifact(_))
    ));
}
