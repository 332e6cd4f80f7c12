//! Feedforward binary classifier on candle.
//!
//! Hidden ReLU layers with dropout, a single logit output, binary
//! cross-entropy loss and AdamW. An optional eval set drives early
//! stopping; a non-finite loss aborts the fit as a training failure
//! instead of crashing the run.
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Dropout, Linear, Module, Optimizer, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{ModelConfig, ModelType};
use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;

struct FnnNet {
    hidden: Vec<Linear>,
    output: Linear,
    dropout: Dropout,
    varmap: VarMap,
    device: Device,
    input_dim: usize,
    hidden_dims: Vec<usize>,
}

impl FnnNet {
    fn build(
        input_dim: usize,
        hidden_dims: Vec<usize>,
        dropout: f32,
        device: Device,
    ) -> candle_core::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let mut hidden = Vec::with_capacity(hidden_dims.len());
        let mut in_dim = input_dim;
        for (i, &dim) in hidden_dims.iter().enumerate() {
            hidden.push(linear(in_dim, dim, vb.pp(format!("fc{}", i)))?);
            in_dim = dim;
        }
        let output = linear(in_dim, 1, vb.pp("out"))?;
        Ok(FnnNet {
            hidden,
            output,
            dropout: Dropout::new(dropout),
            varmap,
            device,
            input_dim,
            hidden_dims,
        })
    }

    /// Forward pass to logits of shape (n,).
    fn forward(&self, x: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for layer in &self.hidden {
            h = layer.forward(&h)?.relu()?;
            h = self.dropout.forward(&h, train)?;
        }
        self.output.forward(&h)?.squeeze(1)
    }

    fn input_tensor(&self, x: &Array2<f32>) -> candle_core::Result<Tensor> {
        Tensor::from_slice(x.as_slice(), (x.nrows(), x.ncols()), &self.device)
    }
}

/// Feedforward network classifier.
pub struct FnnClassifier {
    params: ModelConfig,
    net: Option<FnnNet>,
}

impl FnnClassifier {
    pub fn new(params: ModelConfig) -> Self {
        FnnClassifier { params, net: None }
    }

    /// Rebuild a fitted classifier from persisted weights.
    pub fn load(
        path: &Path,
        input_dim: usize,
        hidden_dims: Vec<usize>,
        params: ModelConfig,
    ) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::Persistence(format!(
                "classifier weights not found: {}",
                path.display()
            )));
        }
        let ModelType::Feedforward { dropout, .. } = params.model_type;
        let mut net = FnnNet::build(input_dim, hidden_dims, dropout, Device::Cpu)
            .map_err(|e| PipelineError::CorruptArtifact(e.to_string()))?;
        net.varmap.load(path).map_err(|e| {
            PipelineError::CorruptArtifact(format!(
                "failed to load classifier weights from {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(FnnClassifier {
            params,
            net: Some(net),
        })
    }

    fn derive_hidden_dims(&self, input_dim: usize) -> Vec<usize> {
        let ModelType::Feedforward { ref hidden_dims, .. } = self.params.model_type;
        if hidden_dims.is_empty() {
            vec![(input_dim / 2).max(1), (input_dim / 4).max(1)]
        } else {
            hidden_dims.clone()
        }
    }

    fn eval_loss(
        net: &FnnNet,
        x_eval: &Tensor,
        y_eval: &Tensor,
    ) -> candle_core::Result<f32> {
        let logits = net.forward(x_eval, false)?;
        let loss = candle_nn::loss::binary_cross_entropy_with_logit(&logits, y_eval)?;
        loss.to_scalar::<f32>()
    }
}

fn train_err(e: candle_core::Error) -> PipelineError {
    PipelineError::Training(e.to_string())
}

impl ClassifierModel for FnnClassifier {
    fn fit(
        &mut self,
        x: &Array2<f32>,
        y: &[i8],
        x_eval: Option<&Array2<f32>>,
        y_eval: Option<&[i8]>,
    ) -> Result<(), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Training(format!(
                "feature rows ({}) and labels ({}) disagree",
                x.nrows(),
                y.len()
            )));
        }
        let ModelType::Feedforward {
            batch_size,
            epochs,
            early_stopping_patience,
            dropout,
            seed,
            ..
        } = self.params.model_type;

        let hidden_dims = self.derive_hidden_dims(x.ncols());
        let net = FnnNet::build(x.ncols(), hidden_dims, dropout, Device::Cpu)
            .map_err(train_err)?;

        let params = candle_nn::ParamsAdamW {
            lr: self.params.learning_rate,
            ..Default::default()
        };
        let mut opt =
            candle_nn::AdamW::new(net.varmap.all_vars(), params).map_err(train_err)?;

        let eval_tensors = match (x_eval, y_eval) {
            (Some(xe), Some(ye)) => {
                let xt = net.input_tensor(xe).map_err(train_err)?;
                let targets: Vec<f32> = ye.iter().map(|&v| v as f32).collect();
                let yt = Tensor::from_slice(&targets, targets.len(), &net.device)
                    .map_err(train_err)?;
                Some((xt, yt))
            }
            _ => None,
        };

        let n = x.nrows();
        let batch_size = batch_size.max(1).min(n);
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut best_eval = f32::INFINITY;
        let mut epochs_without_improvement = 0usize;

        for epoch in 0..epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0f32;
            let mut batches = 0usize;
            for chunk in order.chunks(batch_size) {
                let xb = x.select_rows(chunk);
                let xt = net.input_tensor(&xb).map_err(train_err)?;
                let targets: Vec<f32> = chunk.iter().map(|&i| y[i] as f32).collect();
                let yt = Tensor::from_slice(&targets, targets.len(), &net.device)
                    .map_err(train_err)?;

                let logits = net.forward(&xt, true).map_err(train_err)?;
                let loss = candle_nn::loss::binary_cross_entropy_with_logit(&logits, &yt)
                    .map_err(train_err)?;
                opt.backward_step(&loss).map_err(train_err)?;

                let loss_value = loss.to_scalar::<f32>().map_err(train_err)?;
                if !loss_value.is_finite() {
                    return Err(PipelineError::Training(format!(
                        "non-finite loss at epoch {}",
                        epoch
                    )));
                }
                epoch_loss += loss_value;
                batches += 1;
            }
            log::trace!(
                "fnn epoch {}: avg batch loss {:.6}",
                epoch,
                epoch_loss / batches.max(1) as f32
            );

            if let Some((ref xt, ref yt)) = eval_tensors {
                let eval = Self::eval_loss(&net, xt, yt).map_err(train_err)?;
                if !eval.is_finite() {
                    return Err(PipelineError::Training(format!(
                        "non-finite validation loss at epoch {}",
                        epoch
                    )));
                }
                if eval < best_eval {
                    best_eval = eval;
                    epochs_without_improvement = 0;
                } else {
                    epochs_without_improvement += 1;
                    if epochs_without_improvement >= early_stopping_patience {
                        log::debug!(
                            "fnn early stop at epoch {} (best eval loss {:.6})",
                            epoch,
                            best_eval
                        );
                        break;
                    }
                }
            }
        }

        self.net = Some(net);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>, PipelineError> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| PipelineError::Training("classifier used before fit".to_string()))?;
        if x.ncols() != net.input_dim {
            return Err(PipelineError::Training(format!(
                "feature width {} does not match trained input width {}",
                x.ncols(),
                net.input_dim
            )));
        }
        let xt = net.input_tensor(x).map_err(train_err)?;
        let logits = net.forward(&xt, false).map_err(train_err)?;
        let probs = candle_nn::ops::sigmoid(&logits).map_err(train_err)?;
        probs.to_vec1::<f32>().map_err(train_err)
    }

    fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| PipelineError::Persistence("cannot save an unfitted classifier".to_string()))?;
        net.varmap
            .save(path)
            .map_err(|e| PipelineError::Persistence(e.to_string()))
    }

    fn hidden_dims(&self) -> Vec<usize> {
        self.net
            .as_ref()
            .map(|n| n.hidden_dims.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "feedforward"
    }
}
