//! Deterministic stratified partitioning for one label column.
//!
//! Records whose label is the missing sentinel are excluded before any
//! split. All shuffling runs on a seeded `StdRng`, so an identical seed
//! reproduces an identical partition.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data_handling::MISSING_LABEL;
use crate::error::PipelineError;
use crate::math::Array1;

/// One train/test partition over a label's non-missing record indices.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_indices(labels: &Array1<i8>) -> (Vec<usize>, Vec<usize>) {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (i, &value) in labels.iter().enumerate() {
        match value {
            1 => positives.push(i),
            0 => negatives.push(i),
            v if v == MISSING_LABEL => {}
            v => {
                // Anything outside {0, 1, missing} is treated as missing.
                log::warn!("record {} carries unexpected label value {}", i, v);
            }
        }
    }
    (positives, negatives)
}

/// Stratified single holdout split.
///
/// The test side receives `test_fraction` of each class (rounded to the
/// nearest record). Errors when any of the four resulting groups would be
/// empty.
pub fn holdout(
    labels: &Array1<i8>,
    test_fraction: f32,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), PipelineError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::Configuration(format!(
            "test_fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }
    let (mut positives, mut negatives) = class_indices(labels);
    let mut rng = StdRng::seed_from_u64(seed);
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (class, pool) in [("positive", &positives), ("negative", &negatives)] {
        let n_test = (pool.len() as f32 * test_fraction).round() as usize;
        if n_test == 0 || n_test >= pool.len() {
            return Err(PipelineError::InsufficientData(format!(
                "{} class with {} record(s) cannot be split at test_fraction {}",
                class,
                pool.len(),
                test_fraction
            )));
        }
        test.extend_from_slice(&pool[..n_test]);
        train.extend_from_slice(&pool[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Stratified k-fold partition.
///
/// Every non-missing record lands in exactly one test fold; per-class test
/// counts across folds differ by at most one record. Errors when either
/// class has fewer than `k` members.
pub fn kfold(labels: &Array1<i8>, k: usize, seed: u64) -> Result<Vec<Fold>, PipelineError> {
    if k < 2 {
        return Err(PipelineError::Configuration(format!(
            "fold count must be at least 2, got {}",
            k
        )));
    }
    let (mut positives, mut negatives) = class_indices(labels);
    if positives.len() < k || negatives.len() < k {
        return Err(PipelineError::InsufficientData(format!(
            "{} positive / {} negative record(s) cannot fill {} folds",
            positives.len(),
            negatives.len(),
            k
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    // Round-robin assignment keeps per-class fold sizes within one record.
    let mut test_sets: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &idx) in positives.iter().enumerate() {
        test_sets[i % k].push(idx);
    }
    for (i, &idx) in negatives.iter().enumerate() {
        test_sets[i % k].push(idx);
    }

    let mut labeled: Vec<usize> = positives.iter().chain(negatives.iter()).copied().collect();
    labeled.sort_unstable();

    let folds = test_sets
        .into_iter()
        .map(|mut test| {
            test.sort_unstable();
            let train = labeled
                .iter()
                .copied()
                .filter(|idx| test.binary_search(idx).is_err())
                .collect();
            Fold { train, test }
        })
        .collect::<Vec<_>>();

    log::trace!(
        "Partitioned {} labeled records into {} stratified folds (seed {})",
        labeled.len(),
        k,
        seed
    );
    Ok(folds)
}
