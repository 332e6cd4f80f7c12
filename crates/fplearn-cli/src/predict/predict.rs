//! Prediction pipeline: reload persisted models and score new structures.
use std::path::Path;

use anyhow::{anyhow, Result};

use fplearn_classifiers::data_handling::Representation;
use fplearn_classifiers::fingerprint::generate_fingerprints;
use fplearn_classifiers::io::{read_compound_csv, write_predictions_csv, Prediction};
use fplearn_classifiers::math::Array2;
use fplearn_classifiers::models::classifier_trait::ClassifierModel;
use fplearn_classifiers::registry::{ArtifactKind, ModelRegistry};
use fplearn_classifiers::stats::DECISION_THRESHOLD;
use fplearn_compression::Autoencoder;

use crate::predict::input::PredictConfig;
use crate::train::trainer::resolve_generator;

pub fn run_prediction(config: &PredictConfig) -> Result<()> {
    let classifier_path = Path::new(&config.classifier_file);
    let (classifier, meta) = ModelRegistry::load_classifier(classifier_path)?;
    let label = meta
        .label
        .clone()
        .ok_or_else(|| anyhow!("classifier metadata carries no label name"))?;
    let representation = meta.representation.unwrap_or(Representation::Raw);

    let table = read_compound_csv(&config.input_file)?;
    let generator = resolve_generator(&config.input_type);
    let (store, _dropped) =
        generate_fingerprints(&table, generator.as_ref(), config.fingerprint_size)?;

    let features: Array2<f32> = match representation {
        Representation::Raw => {
            meta.expect_input_dim(store.feature_len())?;
            store.features().clone()
        }
        Representation::Compressed => {
            let compressor_file = config.compressor_file.as_ref().ok_or_else(|| {
                anyhow!("classifier was trained on compressed features; pass --compressor")
            })?;
            let compressor_path = Path::new(compressor_file);
            let compressor_meta = ModelRegistry::load_metadata(compressor_path)?;
            compressor_meta.expect_kind(ArtifactKind::Compressor)?;
            compressor_meta.expect_input_dim(store.feature_len())?;
            if compressor_meta.output_dim != meta.input_dim {
                return Err(anyhow!(
                    "compressor produces {} dims but the classifier expects {}",
                    compressor_meta.output_dim,
                    meta.input_dim
                ));
            }
            let autoencoder = Autoencoder::load(
                compressor_path,
                compressor_meta.input_dim,
                compressor_meta.output_dim,
            )?;
            let flat = autoencoder.encode(store.features().as_slice(), store.len())?;
            Array2::from_shape_vec((store.len(), autoencoder.encoding_dim()), flat)?
        }
    };

    let probs = classifier.predict_proba(&features)?;

    let predictions: Vec<Prediction> = store
        .ids()
        .iter()
        .zip(&probs)
        .map(|(id, &probability)| Prediction {
            id: id.clone(),
            probability,
            label: (probability >= DECISION_THRESHOLD) as u8,
        })
        .collect();

    write_predictions_csv(&config.output_file, &label, &predictions)?;
    Ok(())
}
