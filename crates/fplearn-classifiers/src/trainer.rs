//! Cross-validated training for one label and one feature representation.
//!
//! Every fold fits a fresh classifier instance; parameters are never
//! reused across folds. The early-stopping eval set is carved out of the
//! fold's training indices only, so test records stay unseen until
//! evaluation. Folds run concurrently under rayon; the aggregate is an
//! order-independent reduction over the surviving folds.
use rayon::prelude::*;

use crate::data_handling::Representation;
use crate::error::PipelineError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::ClassifierModel;
use crate::splitter::{holdout, Fold};
use crate::stats::{aggregate, fold_metrics, AggregatedMetrics, FoldFailure, FoldMetrics};

/// A fitted classifier together with its provenance and scores.
pub struct TrainedClassifier {
    pub model: Box<dyn ClassifierModel>,
    pub label: String,
    pub representation: Representation,
    pub metrics: AggregatedMetrics,
    /// Fold whose weights are carried by `model`.
    pub best_fold: usize,
}

type FoldOutcome = Result<(FoldMetrics, Box<dyn ClassifierModel>), FoldFailure>;

fn run_fold(
    fold_idx: usize,
    fold: &Fold,
    x: &Array2<f32>,
    y: &Array1<i8>,
    validation_fraction: f32,
    seed: u64,
    factory: &(dyn Fn() -> Box<dyn ClassifierModel> + Sync),
) -> FoldOutcome {
    let fail = |reason: String| FoldFailure {
        fold: fold_idx,
        reason,
    };

    // Carve the eval set out of the fold-train indices; the fold's test
    // indices never enter here. Small folds fall back to fitting without
    // early stopping.
    let train_labels: Array1<i8> = fold.train.iter().map(|&i| y[i]).collect();
    let (fit_abs, eval_abs) =
        match holdout(&train_labels, validation_fraction, seed.wrapping_add(fold_idx as u64)) {
            Ok((fit_rel, eval_rel)) => {
                let fit: Vec<usize> = fit_rel.iter().map(|&r| fold.train[r]).collect();
                let eval: Vec<usize> = eval_rel.iter().map(|&r| fold.train[r]).collect();
                (fit, Some(eval))
            }
            Err(e) => {
                log::debug!(
                    "fold {}: fitting without an eval split ({})",
                    fold_idx,
                    e
                );
                (fold.train.clone(), None)
            }
        };

    let x_fit = x.select_rows(&fit_abs);
    let y_fit: Vec<i8> = fit_abs.iter().map(|&i| y[i]).collect();
    let eval_data = eval_abs.map(|idx| {
        let x_eval = x.select_rows(&idx);
        let y_eval: Vec<i8> = idx.iter().map(|&i| y[i]).collect();
        (x_eval, y_eval)
    });

    let mut model = factory();
    let fit_result = match &eval_data {
        Some((x_eval, y_eval)) => model.fit(&x_fit, &y_fit, Some(x_eval), Some(y_eval.as_slice())),
        None => model.fit(&x_fit, &y_fit, None, None),
    };
    if let Err(e) = fit_result {
        return Err(fail(e.to_string()));
    }

    let x_test = x.select_rows(&fold.test);
    let y_test: Vec<i8> = fold.test.iter().map(|&i| y[i]).collect();
    let probs = match model.predict_proba(&x_test) {
        Ok(p) => p,
        Err(e) => return Err(fail(e.to_string())),
    };
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(fail("non-finite predicted probability".to_string()));
    }

    match fold_metrics(fold_idx, &probs, &y_test) {
        Some(metrics) => Ok((metrics, model)),
        None => Err(fail("test fold contains a single class".to_string())),
    }
}

/// Run cross-validation over pre-computed folds.
///
/// Fit failures are recorded per fold and excluded from the aggregate;
/// the call errors only when every fold failed. The returned model carries
/// the weights of the fold with the highest AUC (earliest fold on ties).
#[allow(clippy::too_many_arguments)]
pub fn cross_validate(
    x: &Array2<f32>,
    y: &Array1<i8>,
    label: &str,
    representation: Representation,
    folds: &[Fold],
    validation_fraction: f32,
    seed: u64,
    factory: &(dyn Fn() -> Box<dyn ClassifierModel> + Sync),
) -> Result<TrainedClassifier, PipelineError> {
    log::info!(
        "Cross-validating label '{}' on {} features over {} folds",
        label,
        representation,
        folds.len()
    );

    let outcomes: Vec<FoldOutcome> = folds
        .par_iter()
        .enumerate()
        .map(|(fold_idx, fold)| {
            log::debug!(
                "fold {}: {} train / {} test records",
                fold_idx,
                fold.train.len(),
                fold.test.len()
            );
            run_fold(fold_idx, fold, x, y, validation_fraction, seed, factory)
        })
        .collect();

    let mut per_fold = Vec::new();
    let mut models = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok((metrics, model)) => {
                per_fold.push(metrics);
                models.push(model);
            }
            Err(failure) => {
                log::warn!(
                    "label '{}' ({}): fold {} failed: {}",
                    label,
                    representation,
                    failure.fold,
                    failure.reason
                );
                failures.push(failure);
            }
        }
    }

    if per_fold.is_empty() {
        return Err(PipelineError::Training(format!(
            "label '{}' ({}): all {} folds failed",
            label,
            representation,
            folds.len()
        )));
    }

    // Highest per-fold AUC wins; earlier fold on exact ties.
    let mut best_pos = 0;
    for (i, metrics) in per_fold.iter().enumerate() {
        if metrics.auc > per_fold[best_pos].auc {
            best_pos = i;
        }
    }
    let best_fold = per_fold[best_pos].fold;
    let model = models.swap_remove(best_pos);

    let metrics = aggregate(per_fold, failures);
    log::info!(
        "label '{}' ({}): AUC {:.4} ± {:.4} over {} fold(s), {} failed",
        label,
        representation,
        metrics.mean.auc,
        metrics.std_dev.auc,
        metrics.per_fold.len(),
        metrics.failures.len()
    );

    Ok(TrainedClassifier {
        model,
        label: label.to_string(),
        representation,
        metrics,
        best_fold,
    })
}

/// Pick the best candidate by mean ROC AUC.
///
/// Selection metric: highest mean AUC across surviving folds; ties broken
/// by lowest AUC standard deviation, then by earliest candidate.
pub fn select_best(candidates: Vec<TrainedClassifier>) -> Option<TrainedClassifier> {
    let mut best: Option<TrainedClassifier> = None;
    for candidate in candidates {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let better = candidate.metrics.mean.auc > current.metrics.mean.auc
                    || (candidate.metrics.mean.auc == current.metrics.mean.auc
                        && candidate.metrics.std_dev.auc < current.metrics.std_dev.auc);
                if better {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best
}
