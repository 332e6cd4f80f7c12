//! Training pipeline orchestration.
//!
//! Control flow: read the compound table, fingerprint every record, train
//! (or load) the compressor on the full unlabeled population, then for
//! each label and each feature representation run stratified k-fold
//! cross-validation and persist the fitted models. Per-label and per-fold
//! failures are collected into the run summary; only configuration errors
//! abort the run up front.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use fplearn_classifiers::config::PipelineConfig;
use fplearn_classifiers::data_handling::{FeatureStore, Representation};
use fplearn_classifiers::error::PipelineError;
use fplearn_classifiers::fingerprint::{
    generate_fingerprints, BitStringParser, FingerprintGenerator, HashedSubstructureGenerator,
};
use fplearn_classifiers::io::{read_compound_csv, write_metrics_report};
use fplearn_classifiers::math::Array2;
use fplearn_classifiers::models::factory::build_model;
use fplearn_classifiers::registry::{ArtifactKind, ModelRegistry};
use fplearn_classifiers::report::{LabelOutcome, RepresentationOutcome, RunSummary};
use fplearn_classifiers::splitter;
use fplearn_classifiers::stats::AggregatedMetrics;
use fplearn_classifiers::trainer::{cross_validate, select_best, TrainedClassifier};
use fplearn_compression::{Autoencoder, CompressorConfig};

pub fn resolve_generator(input_type: &str) -> Box<dyn FingerprintGenerator> {
    match input_type {
        "bits" => Box::new(BitStringParser),
        _ => Box::new(HashedSubstructureGenerator::default()),
    }
}

/// Train or reload the compressor against the full feature population.
fn prepare_compressor(
    config: &PipelineConfig,
    store: &FeatureStore,
    registry: &ModelRegistry,
) -> Result<Autoencoder> {
    match &config.compressor_file {
        Some(path) => {
            let path = Path::new(path);
            log::info!("Loading compressor weights from {}", path.display());
            let meta = ModelRegistry::load_metadata(path)?;
            meta.expect_kind(ArtifactKind::Compressor)?;
            meta.expect_input_dim(store.feature_len())?;
            Ok(Autoencoder::load(path, meta.input_dim, meta.output_dim)?)
        }
        None => {
            let compressor_config = CompressorConfig {
                encoding_dim: config.encoding_dim,
                epochs: config.epochs,
                batch_size: config.batch_size,
                learning_rate: config.learning_rate,
                validation_fraction: config.test_fraction,
                early_stopping_patience: config.early_stopping_patience,
                seed: config.seed,
            };
            let trained = Autoencoder::train(
                store.features().as_slice(),
                store.len(),
                store.feature_len(),
                &compressor_config,
            )?;
            registry.save_compressor(trained.input_dim(), trained.encoding_dim(), |tmp| {
                trained
                    .save(tmp)
                    .map_err(|e| PipelineError::Persistence(e.to_string()))
            })?;
            Ok(trained)
        }
    }
}

pub fn run_training(config: &PipelineConfig) -> Result<()> {
    config.validate()?;

    let table = read_compound_csv(&config.input_file)?;
    let generator = resolve_generator(&config.input_type);
    let (store, dropped) =
        generate_fingerprints(&table, generator.as_ref(), config.fingerprint_size)?;
    store.log_summary();

    let run_id = ModelRegistry::generate_run_id();
    let registry = ModelRegistry::new(&config.output_dir, &run_id, config.overwrite)?;
    let mut summary = RunSummary::new(run_id.clone(), dropped);

    // One compressor per run, shared read-only by every label below.
    let compressed: Option<Array2<f32>> = if config.compress {
        let autoencoder = prepare_compressor(config, &store, &registry)?;
        let flat = autoencoder.encode(store.features().as_slice(), store.len())?;
        Some(Array2::from_shape_vec(
            (store.len(), autoencoder.encoding_dim()),
            flat,
        )?)
    } else {
        None
    };

    let model_config = config.model_config();
    let factory = move || build_model(model_config.clone());

    let mut metric_rows: Vec<(String, Representation, AggregatedMetrics)> = Vec::new();

    for label in store.label_names().to_vec() {
        let y = store
            .label_column(&label)
            .expect("label name comes from the store itself");

        let folds = match splitter::kfold(&y, config.k_folds, config.seed) {
            Ok(folds) => folds,
            Err(e) => {
                log::warn!("Skipping label '{}': {}", label, e);
                summary.add_skipped(&label, e.to_string());
                continue;
            }
        };

        let mut representations: Vec<(Representation, &Array2<f32>)> =
            vec![(Representation::Raw, store.features())];
        if let Some(ref matrix) = compressed {
            representations.push((Representation::Compressed, matrix));
        }

        let mut candidates: Vec<TrainedClassifier> = Vec::new();
        let mut outcomes: Vec<RepresentationOutcome> = Vec::new();
        for (representation, matrix) in representations {
            let trained = match cross_validate(
                matrix,
                &y,
                &label,
                representation,
                &folds,
                config.test_fraction,
                config.seed,
                &factory,
            ) {
                Ok(trained) => trained,
                Err(e) => {
                    log::warn!("label '{}' ({}): {}", label, representation, e);
                    continue;
                }
            };
            let artifact = match registry.save_classifier(&trained, matrix.ncols()) {
                Ok(path) => path,
                Err(e) => {
                    log::error!(
                        "label '{}' ({}): could not persist model: {}",
                        label,
                        representation,
                        e
                    );
                    continue;
                }
            };
            metric_rows.push((label.clone(), representation, trained.metrics.clone()));
            outcomes.push(RepresentationOutcome {
                representation,
                mean: trained.metrics.mean,
                std_dev: trained.metrics.std_dev,
                failed_folds: trained.metrics.failures.len(),
                artifact: artifact.display().to_string(),
            });
            candidates.push(trained);
        }

        match select_best(candidates) {
            Some(best) => summary.add_label(LabelOutcome {
                label: label.clone(),
                best_representation: best.representation,
                best_auc: best.metrics.mean.auc,
                representations: outcomes,
            }),
            None => summary.add_skipped(&label, "no representation produced a model"),
        }
    }

    let report_path = registry
        .directory()
        .join(format!("metrics.{}.csv", run_id));
    write_metrics_report(&report_path, &metric_rows)?;

    let summary_path = registry
        .directory()
        .join(format!("summary.{}.json", run_id));
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write run summary: {}", summary_path.display()))?;

    let config_json = serde_json::to_string_pretty(config)?;
    println!("{}", config_json);
    let config_path = registry.directory().join(format!("config.{}.json", run_id));
    fs::write(&config_path, config_json)
        .with_context(|| format!("Failed to write config echo: {}", config_path.display()))?;

    log::info!("{}", summary);
    Ok(())
}
