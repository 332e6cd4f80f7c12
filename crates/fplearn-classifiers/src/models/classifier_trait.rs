use std::path::Path;

use crate::error::PipelineError;
use crate::math::Array2;

/// Contract for binary classifiers used by the cross-validation trainer.
///
/// `y` uses the crate convention: 1 positive, 0 negative (missing labels
/// never reach a classifier). Implementations are `Send` so independent
/// folds can train concurrently.
pub trait ClassifierModel: Send {
    /// Fit the model. The optional eval set monitors convergence for early
    /// stopping; it must never overlap the caller's test records.
    fn fit(
        &mut self,
        x: &Array2<f32>,
        y: &[i8],
        x_eval: Option<&Array2<f32>>,
        y_eval: Option<&[i8]>,
    ) -> Result<(), PipelineError>;

    /// Predict probabilities in [0, 1]; deterministic for fixed weights.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, PipelineError>;

    /// Persist fitted weights to `path` (safetensors).
    fn save(&self, path: &Path) -> Result<(), PipelineError>;

    /// Hidden layer widths actually used, known after `fit`.
    fn hidden_dims(&self) -> Vec<usize>;

    /// Human readable name for the model.
    fn name(&self) -> &str {
        "classifier"
    }
}
