//! Data structures for the fingerprint/label population.
//!
//! `FeatureStore` is the single source of truth for features and labels
//! during a run: built once from the input table, never mutated afterwards.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::math::{Array1, Array2};

/// Sentinel for an absent label value in the label matrix.
pub const MISSING_LABEL: i8 = -1;

/// Which feature matrix a classifier consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    Raw,
    Compressed,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Raw => "raw",
            Representation::Compressed => "compressed",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One molecule before columnar assembly: identifier, bit vector (0.0/1.0
/// per position) and per-label values (0, 1 or [`MISSING_LABEL`]).
#[derive(Debug, Clone)]
pub struct FingerprintRecord {
    pub id: String,
    pub features: Vec<f32>,
    pub labels: Vec<i8>,
}

/// Columnar, immutable store of all surviving records.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    ids: Vec<String>,
    x: Array2<f32>,
    labels: Array2<i8>,
    label_names: Vec<String>,
}

impl FeatureStore {
    /// Assemble a store from records, validating that every record carries
    /// the same fingerprint width and one value per label column.
    pub fn from_records(
        records: Vec<FingerprintRecord>,
        label_names: Vec<String>,
    ) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::InsufficientData(
                "no records to build a feature store from".to_string(),
            ));
        }
        let feature_len = records[0].features.len();
        if feature_len == 0 {
            return Err(PipelineError::Configuration(
                "fingerprint width must be positive".to_string(),
            ));
        }
        let mut ids = Vec::with_capacity(records.len());
        let mut feature_rows = Vec::with_capacity(records.len());
        let mut label_rows = Vec::with_capacity(records.len());
        for record in records {
            if record.features.len() != feature_len {
                return Err(PipelineError::Configuration(format!(
                    "record '{}' has fingerprint width {}, expected {}",
                    record.id,
                    record.features.len(),
                    feature_len
                )));
            }
            if record.labels.len() != label_names.len() {
                return Err(PipelineError::Configuration(format!(
                    "record '{}' has {} label values, expected {}",
                    record.id,
                    record.labels.len(),
                    label_names.len()
                )));
            }
            ids.push(record.id);
            feature_rows.push(record.features);
            label_rows.push(record.labels);
        }
        let x = Array2::from_rows(feature_rows)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let labels = Array2::from_rows(label_rows)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        Ok(FeatureStore {
            ids,
            x,
            labels,
            label_names,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn feature_len(&self) -> usize {
        self.x.ncols()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.x
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Per-record values for one label column.
    pub fn label_column(&self, name: &str) -> Option<Array1<i8>> {
        let idx = self.label_names.iter().position(|n| n == name)?;
        Some(self.labels.column(idx))
    }

    pub fn log_summary(&self) {
        log::info!(
            "Feature store: {} records, {} fingerprint bits, {} label column(s)",
            self.len(),
            self.feature_len(),
            self.label_names.len()
        );
        for name in &self.label_names {
            let column = self
                .label_column(name)
                .expect("label name comes from the store itself");
            let positives = column.iter().filter(|&&v| v == 1).count();
            let negatives = column.iter().filter(|&&v| v == 0).count();
            let missing = column.len() - positives - negatives;
            log::info!(
                "  label '{}': {} positive, {} negative, {} missing",
                name,
                positives,
                negatives,
                missing
            );
        }
    }
}
