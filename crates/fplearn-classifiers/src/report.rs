//! Run-level summary: which labels succeeded, which were skipped and why,
//! and how many folds failed along the way.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_handling::Representation;
use crate::stats::MetricSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepresentationOutcome {
    pub representation: Representation,
    pub mean: MetricSummary,
    pub std_dev: MetricSummary,
    pub failed_folds: usize,
    pub artifact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelOutcome {
    pub label: String,
    pub best_representation: Representation,
    pub best_auc: f32,
    pub representations: Vec<RepresentationOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedLabel {
    pub label: String,
    pub reason: String,
}

/// Aggregated outcome of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub dropped_records: usize,
    pub succeeded: Vec<LabelOutcome>,
    pub skipped: Vec<SkippedLabel>,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>, dropped_records: usize) -> Self {
        RunSummary {
            run_id: run_id.into(),
            dropped_records,
            succeeded: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn add_label(&mut self, outcome: LabelOutcome) {
        self.succeeded.push(outcome);
    }

    pub fn add_skipped(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedLabel {
            label: label.into(),
            reason: reason.into(),
        });
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----- Training Run Summary ({}) -----", self.run_id)?;
        if self.dropped_records > 0 {
            writeln!(
                f,
                "{} record(s) dropped during fingerprint generation",
                self.dropped_records
            )?;
        }
        for outcome in &self.succeeded {
            writeln!(
                f,
                "label '{}': best {} (AUC {:.4})",
                outcome.label, outcome.best_representation, outcome.best_auc
            )?;
            for repr in &outcome.representations {
                writeln!(
                    f,
                    "  {}: AUC {:.4} ± {:.4}, {} failed fold(s)",
                    repr.representation, repr.mean.auc, repr.std_dev.auc, repr.failed_folds
                )?;
            }
        }
        for skipped in &self.skipped {
            writeln!(f, "label '{}': skipped ({})", skipped.label, skipped.reason)?;
        }
        write!(
            f,
            "{} label(s) trained, {} skipped",
            self.succeeded.len(),
            self.skipped.len()
        )
    }
}
