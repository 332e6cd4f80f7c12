//! Writers for prediction and metrics-report output files.
use std::path::Path;

use anyhow::{Context, Result};

use crate::data_handling::Representation;
use crate::stats::AggregatedMetrics;

/// One scored record in prediction mode.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub id: String,
    pub probability: f32,
    pub label: u8,
}

/// Write predictions as CSV: identifier, probability, thresholded label.
pub fn write_predictions_csv<P: AsRef<Path>>(
    path: P,
    label_name: &str,
    predictions: &[Prediction],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path).with_context(|| {
        format!("Failed to create predictions file: {}", path.as_ref().display())
    })?;
    let prob_column = format!("{}_probability", label_name);
    writer.write_record([&"id".to_string(), &prob_column, &label_name.to_string()])?;
    for p in predictions {
        let probability = format!("{:.6}", p.probability);
        let label = p.label.to_string();
        writer.write_record([&p.id, &probability, &label])?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} prediction(s) to {}",
        predictions.len(),
        path.as_ref().display()
    );
    Ok(())
}

fn metric_record(
    label: &str,
    representation: Representation,
    fold: &str,
    values: [f32; 5],
) -> Vec<String> {
    let mut record = vec![
        label.to_string(),
        representation.as_str().to_string(),
        fold.to_string(),
    ];
    record.extend(values.iter().map(|v| format!("{:.6}", v)));
    record
}

/// Write the per-fold and aggregated metrics for every trained
/// label/representation pair: one row per fold plus `mean` and `std` rows.
pub fn write_metrics_report<P: AsRef<Path>>(
    path: P,
    results: &[(String, Representation, AggregatedMetrics)],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path).with_context(|| {
        format!("Failed to create metrics report: {}", path.as_ref().display())
    })?;
    writer.write_record([
        "label",
        "representation",
        "fold",
        "accuracy",
        "precision",
        "recall",
        "f1",
        "auc",
    ])?;
    for (label, representation, metrics) in results {
        for fold in &metrics.per_fold {
            writer.write_record(metric_record(
                label,
                *representation,
                &fold.fold.to_string(),
                [fold.accuracy, fold.precision, fold.recall, fold.f1, fold.auc],
            ))?;
        }
        for (name, summary) in [("mean", &metrics.mean), ("std", &metrics.std_dev)] {
            writer.write_record(metric_record(
                label,
                *representation,
                name,
                [
                    summary.accuracy,
                    summary.precision,
                    summary.recall,
                    summary.f1,
                    summary.auc,
                ],
            ))?;
        }
    }
    writer.flush()?;
    log::info!("Wrote metrics report to {}", path.as_ref().display());
    Ok(())
}
