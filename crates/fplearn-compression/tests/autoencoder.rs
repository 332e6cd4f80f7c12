//! Integration tests for autoencoder training, encoding and persistence.

use fplearn_compression::{Autoencoder, CompressorConfig, CompressorError};

fn bit_population(nrows: usize, width: usize) -> Vec<f32> {
    // Deterministic, structured bit pattern so there is something to learn.
    let mut data = Vec::with_capacity(nrows * width);
    for row in 0..nrows {
        for col in 0..width {
            let bit = ((row * 7 + col * 3) % 5 == 0) || (col % (row % 3 + 2) == 0);
            data.push(if bit { 1.0 } else { 0.0 });
        }
    }
    data
}

fn tiny_config() -> CompressorConfig {
    CompressorConfig {
        encoding_dim: 4,
        epochs: 5,
        batch_size: 8,
        learning_rate: 1e-3,
        validation_fraction: 0.2,
        early_stopping_patience: 3,
        seed: 7,
    }
}

// ---------------------------------------------------------------------------
// configuration validation (before any epoch runs)
// ---------------------------------------------------------------------------

#[test]
fn encoding_dim_not_below_input_is_configuration_error() {
    let features = bit_population(8, 16);
    let mut config = tiny_config();
    config.encoding_dim = 16;
    match Autoencoder::train(&features, 8, 16, &config) {
        Err(CompressorError::Configuration(_)) => {}
        other => panic!("expected Configuration error, got {:?}", other.map(|_| ())),
    }

    config.encoding_dim = 32;
    assert!(matches!(
        Autoencoder::train(&features, 8, 16, &config),
        Err(CompressorError::Configuration(_))
    ));
}

#[test]
fn zero_epochs_is_configuration_error() {
    let features = bit_population(8, 16);
    let mut config = tiny_config();
    config.epochs = 0;
    assert!(matches!(
        Autoencoder::train(&features, 8, 16, &config),
        Err(CompressorError::Configuration(_))
    ));
}

#[test]
fn mismatched_buffer_is_configuration_error() {
    let features = bit_population(8, 16);
    let config = tiny_config();
    assert!(matches!(
        Autoencoder::train(&features, 9, 16, &config),
        Err(CompressorError::Configuration(_))
    ));
}

// ---------------------------------------------------------------------------
// training and encoding
// ---------------------------------------------------------------------------

#[test]
fn train_and_encode_shapes_and_finiteness() {
    let features = bit_population(24, 16);
    let model = Autoencoder::train(&features, 24, 16, &tiny_config()).unwrap();
    assert_eq!(model.input_dim(), 16);
    assert_eq!(model.encoding_dim(), 4);

    let code = model.encode(&features, 24).unwrap();
    assert_eq!(code.len(), 24 * 4);
    assert!(code.iter().all(|v| v.is_finite()));
}

#[test]
fn encode_is_deterministic_for_fixed_weights() {
    let features = bit_population(16, 16);
    let model = Autoencoder::train(&features, 16, 16, &tiny_config()).unwrap();
    let a = model.encode(&features, 16).unwrap();
    let b = model.encode(&features, 16).unwrap();
    assert_eq!(a, b);
}

#[test]
fn encode_rejects_wrong_buffer_width() {
    let features = bit_population(16, 16);
    let model = Autoencoder::train(&features, 16, 16, &tiny_config()).unwrap();
    assert!(model.encode(&features[..15 * 16], 16).is_err());
}

// ---------------------------------------------------------------------------
// persistence round-trip
// ---------------------------------------------------------------------------

#[test]
fn save_load_round_trip_reproduces_encoding() {
    let features = bit_population(24, 16);
    let model = Autoencoder::train(&features, 24, 16, &tiny_config()).unwrap();
    let before = model.encode(&features, 24).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compressor.safetensors");
    model.save(&path).unwrap();

    let reloaded = Autoencoder::load(&path, 16, 4).unwrap();
    let after = reloaded.encode(&features, 24).unwrap();
    assert_eq!(before, after, "round-trip must be bit-for-bit identical");
}

#[test]
fn load_with_mismatched_dimensions_is_corrupt_artifact() {
    let features = bit_population(16, 16);
    let model = Autoencoder::train(&features, 16, 16, &tiny_config()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compressor.safetensors");
    model.save(&path).unwrap();

    match Autoencoder::load(&path, 16, 8) {
        Err(CompressorError::CorruptArtifact(_)) => {}
        other => panic!("expected CorruptArtifact, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn load_missing_file_is_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.safetensors");
    assert!(matches!(
        Autoencoder::load(&path, 16, 4),
        Err(CompressorError::Persistence(_))
    ));
}
