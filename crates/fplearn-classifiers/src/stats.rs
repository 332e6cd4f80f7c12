//! Classification metrics from confusion counts and probability rankings.
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Decision threshold applied to predicted probabilities when counting the
/// confusion matrix. AUC never uses it; AUC ranks the raw probabilities.
pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_pos: usize,
    pub false_pos: usize,
    pub true_neg: usize,
    pub false_neg: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_pos + self.false_pos + self.true_neg + self.false_neg
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_pos + self.true_neg) as f32 / total as f32
    }

    /// Zero when no positive prediction was made.
    pub fn precision(&self) -> f32 {
        let denom = self.true_pos + self.false_pos;
        if denom == 0 {
            return 0.0;
        }
        self.true_pos as f32 / denom as f32
    }

    /// Zero when no positive record exists.
    pub fn recall(&self) -> f32 {
        let denom = self.true_pos + self.false_neg;
        if denom == 0 {
            return 0.0;
        }
        self.true_pos as f32 / denom as f32
    }

    pub fn f1(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

/// Count the confusion matrix at `threshold` (prediction >= threshold is
/// positive).
pub fn confusion_counts(probs: &[f32], truth: &[i8], threshold: f32) -> ConfusionCounts {
    assert_eq!(
        probs.len(),
        truth.len(),
        "predictions and truth must have equal lengths"
    );
    let mut counts = ConfusionCounts::default();
    for (&p, &t) in probs.iter().zip(truth.iter()) {
        let predicted_pos = p >= threshold;
        match (predicted_pos, t == 1) {
            (true, true) => counts.true_pos += 1,
            (true, false) => counts.false_pos += 1,
            (false, false) => counts.true_neg += 1,
            (false, true) => counts.false_neg += 1,
        }
    }
    counts
}

/// Area under the ROC curve from the full probability ranking
/// (rank-sum formulation, ties receive their average rank).
///
/// Returns `None` when either class is absent, which leaves the curve
/// undefined.
pub fn roc_auc(scores: &[f32], truth: &[i8]) -> Option<f32> {
    assert_eq!(
        scores.len(),
        truth.len(),
        "scores and truth must have equal lengths"
    );
    let n_pos = truth.iter().filter(|&&t| t == 1).count();
    let n_neg = truth.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_unstable_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Walk groups of tied scores and hand every member the group's average rank.
    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            if truth[idx] == 1 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let auc = (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg);
    Some(auc as f32)
}

/// Metrics for one cross-validation fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub counts: ConfusionCounts,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub auc: f32,
}

/// Compute all fold metrics in one pass; `None` when AUC is undefined.
pub fn fold_metrics(fold: usize, probs: &[f32], truth: &[i8]) -> Option<FoldMetrics> {
    let auc = roc_auc(probs, truth)?;
    let counts = confusion_counts(probs, truth, DECISION_THRESHOLD);
    Some(FoldMetrics {
        fold,
        counts,
        accuracy: counts.accuracy(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1: counts.f1(),
        auc,
    })
}

/// One fold that did not produce metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldFailure {
    pub fold: usize,
    pub reason: String,
}

/// Mean or standard deviation of each metric over the surviving folds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub auc: f32,
}

/// Per-fold metrics plus their order-independent aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub per_fold: Vec<FoldMetrics>,
    pub failures: Vec<FoldFailure>,
    pub mean: MetricSummary,
    pub std_dev: MetricSummary,
}

fn summarize<F>(per_fold: &[FoldMetrics], pick: F) -> (f32, f32)
where
    F: Fn(&FoldMetrics) -> f32,
{
    let values: Vec<f64> = per_fold.iter().map(|m| pick(m) as f64).collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = (&values).mean();
    // Sample standard deviation; a single fold reports 0 rather than NaN.
    let std = if values.len() < 2 {
        0.0
    } else {
        (&values).std_dev()
    };
    (mean as f32, std as f32)
}

/// Aggregate fold metrics into mean and standard deviation summaries.
///
/// Failed folds are carried for reporting but never enter the averages;
/// the result is identical for any ordering of `per_fold`.
pub fn aggregate(per_fold: Vec<FoldMetrics>, failures: Vec<FoldFailure>) -> AggregatedMetrics {
    let (acc_m, acc_s) = summarize(&per_fold, |m| m.accuracy);
    let (pre_m, pre_s) = summarize(&per_fold, |m| m.precision);
    let (rec_m, rec_s) = summarize(&per_fold, |m| m.recall);
    let (f1_m, f1_s) = summarize(&per_fold, |m| m.f1);
    let (auc_m, auc_s) = summarize(&per_fold, |m| m.auc);
    AggregatedMetrics {
        per_fold,
        failures,
        mean: MetricSummary {
            accuracy: acc_m,
            precision: pre_m,
            recall: rec_m,
            f1: f1_m,
            auc: auc_m,
        },
        std_dev: MetricSummary {
            accuracy: acc_s,
            precision: pre_s,
            recall: rec_s,
            f1: f1_s,
            auc: auc_s,
        },
    }
}
