//! Autoencoder over binary fingerprint populations.
//!
//! Encoder and decoder are mirrored stacks of linear layers whose widths
//! halve from the input width down to the encoding width. Training
//! minimizes binary cross-entropy reconstruction loss with AdamW, monitors
//! a seeded internal train/validation split (independent of any
//! label-specific split) and stops early when the validation loss stops
//! improving. `encode` applies the encoder only and is deterministic for
//! fixed weights.
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, Module, Optimizer, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::CompressorError;

/// Training parameters for the compressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    pub encoding_dim: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of rows held out internally to monitor convergence.
    pub validation_fraction: f32,
    pub early_stopping_patience: usize,
    pub seed: u64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig {
            encoding_dim: 256,
            epochs: 512,
            batch_size: 256,
            learning_rate: 1e-3,
            validation_fraction: 0.2,
            early_stopping_patience: 20,
            seed: 42,
        }
    }
}

/// Trained fingerprint compressor. The decoder exists only during
/// training and persistence; downstream consumers see `encode` alone.
pub struct Autoencoder {
    encoder: Vec<Linear>,
    decoder: Vec<Linear>,
    varmap: VarMap,
    device: Device,
    input_dim: usize,
    encoding_dim: usize,
}

/// Layer widths halving from `input_dim` down to `encoding_dim`.
fn layer_dims(input_dim: usize, encoding_dim: usize) -> Vec<usize> {
    let mut dims = vec![input_dim];
    let mut width = input_dim;
    while width / 2 > encoding_dim {
        width /= 2;
        dims.push(width);
    }
    dims.push(encoding_dim);
    dims
}

impl Autoencoder {
    fn build(
        input_dim: usize,
        encoding_dim: usize,
        device: Device,
    ) -> candle_core::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let dims = layer_dims(input_dim, encoding_dim);

        let mut encoder = Vec::with_capacity(dims.len() - 1);
        for (i, pair) in dims.windows(2).enumerate() {
            encoder.push(linear(pair[0], pair[1], vb.pp(format!("enc{}", i)))?);
        }
        let mut decoder = Vec::with_capacity(dims.len() - 1);
        for (i, pair) in dims.windows(2).rev().enumerate() {
            decoder.push(linear(pair[1], pair[0], vb.pp(format!("dec{}", i)))?);
        }

        Ok(Autoencoder {
            encoder,
            decoder,
            varmap,
            device,
            input_dim,
            encoding_dim,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn encoding_dim(&self) -> usize {
        self.encoding_dim
    }

    /// Encoder forward pass to the bottleneck code.
    fn encode_tensor(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for layer in &self.encoder {
            h = layer.forward(&h)?.relu()?;
        }
        Ok(h)
    }

    /// Full forward pass to reconstruction logits.
    fn reconstruct_logits(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = self.encode_tensor(x)?;
        let last = self.decoder.len() - 1;
        for (i, layer) in self.decoder.iter().enumerate() {
            h = layer.forward(&h)?;
            if i < last {
                h = h.relu()?;
            }
        }
        Ok(h)
    }

    fn batch_tensor(
        features: &[f32],
        input_dim: usize,
        rows: &[usize],
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        let mut data = Vec::with_capacity(rows.len() * input_dim);
        for &row in rows {
            data.extend_from_slice(&features[row * input_dim..(row + 1) * input_dim]);
        }
        Tensor::from_slice(&data, (rows.len(), input_dim), device)
    }

    /// Train a compressor on the full unlabeled feature population.
    ///
    /// `features` is row-major with `nrows * input_dim` values. Parameter
    /// combinations are rejected before any epoch runs.
    pub fn train(
        features: &[f32],
        nrows: usize,
        input_dim: usize,
        config: &CompressorConfig,
    ) -> Result<Self, CompressorError> {
        if config.encoding_dim == 0 || config.encoding_dim >= input_dim {
            return Err(CompressorError::Configuration(format!(
                "encoding_dim ({}) must lie in [1, input_dim) with input_dim {}",
                config.encoding_dim, input_dim
            )));
        }
        if config.epochs == 0 {
            return Err(CompressorError::Configuration(
                "epochs must be positive".to_string(),
            ));
        }
        if nrows == 0 || features.len() != nrows * input_dim {
            return Err(CompressorError::Configuration(format!(
                "feature buffer of length {} does not hold {} rows of width {}",
                features.len(),
                nrows,
                input_dim
            )));
        }

        let model = Self::build(input_dim, config.encoding_dim, Device::Cpu)
            .map_err(|e| CompressorError::Training(e.to_string()))?;

        // Internal split for convergence monitoring, separate from any
        // label-specific split downstream.
        let mut order: Vec<usize> = (0..nrows).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        order.shuffle(&mut rng);
        let n_val = ((nrows as f32 * config.validation_fraction).round() as usize).min(nrows / 2);
        let (val_rows, train_rows) = order.split_at(n_val);
        let mut train_rows = train_rows.to_vec();

        log::info!(
            "Training autoencoder: {} -> {} dims, {} train / {} validation rows, up to {} epochs",
            input_dim,
            config.encoding_dim,
            train_rows.len(),
            val_rows.len(),
            config.epochs
        );

        let params = candle_nn::ParamsAdamW {
            lr: config.learning_rate,
            ..Default::default()
        };
        let mut opt = candle_nn::AdamW::new(model.varmap.all_vars(), params)
            .map_err(|e| CompressorError::Training(e.to_string()))?;

        let val_tensor = if val_rows.is_empty() {
            None
        } else {
            Some(
                Self::batch_tensor(features, input_dim, val_rows, &model.device)
                    .map_err(|e| CompressorError::Training(e.to_string()))?,
            )
        };

        let batch_size = config.batch_size.max(1).min(train_rows.len());
        let mut best_val = f32::INFINITY;
        let mut epochs_without_improvement = 0usize;

        for epoch in 0..config.epochs {
            train_rows.shuffle(&mut rng);
            let mut epoch_loss = 0.0f32;
            let mut batches = 0usize;
            for chunk in train_rows.chunks(batch_size) {
                let xb = Self::batch_tensor(features, input_dim, chunk, &model.device)
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                let logits = model
                    .reconstruct_logits(&xb)
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                let loss = candle_nn::loss::binary_cross_entropy_with_logit(&logits, &xb)
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                opt.backward_step(&loss)
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                let loss_value = loss
                    .to_scalar::<f32>()
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                if !loss_value.is_finite() {
                    return Err(CompressorError::Training(format!(
                        "non-finite reconstruction loss at epoch {}",
                        epoch
                    )));
                }
                epoch_loss += loss_value;
                batches += 1;
            }
            let avg_loss = epoch_loss / batches.max(1) as f32;

            if let Some(ref val) = val_tensor {
                let logits = model
                    .reconstruct_logits(val)
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                let val_loss = candle_nn::loss::binary_cross_entropy_with_logit(&logits, val)
                    .and_then(|l| l.to_scalar::<f32>())
                    .map_err(|e| CompressorError::Training(e.to_string()))?;
                if !val_loss.is_finite() {
                    return Err(CompressorError::Training(format!(
                        "non-finite validation loss at epoch {}",
                        epoch
                    )));
                }
                log::trace!(
                    "autoencoder epoch {}: train loss {:.6}, validation loss {:.6}",
                    epoch,
                    avg_loss,
                    val_loss
                );
                if val_loss < best_val {
                    best_val = val_loss;
                    epochs_without_improvement = 0;
                } else {
                    epochs_without_improvement += 1;
                    if epochs_without_improvement >= config.early_stopping_patience {
                        log::info!(
                            "autoencoder early stop at epoch {} (best validation loss {:.6})",
                            epoch,
                            best_val
                        );
                        break;
                    }
                }
            } else {
                log::trace!("autoencoder epoch {}: train loss {:.6}", epoch, avg_loss);
            }
        }

        Ok(model)
    }

    /// Apply the encoder to a row-major feature buffer; returns the
    /// compressed rows flattened as `nrows * encoding_dim` values.
    pub fn encode(&self, features: &[f32], nrows: usize) -> Result<Vec<f32>, CompressorError> {
        if features.len() != nrows * self.input_dim {
            return Err(CompressorError::Configuration(format!(
                "feature buffer of length {} does not hold {} rows of width {}",
                features.len(),
                nrows,
                self.input_dim
            )));
        }
        let x = Tensor::from_slice(features, (nrows, self.input_dim), &self.device)
            .map_err(|e| CompressorError::Training(e.to_string()))?;
        let code = self
            .encode_tensor(&x)
            .map_err(|e| CompressorError::Training(e.to_string()))?;
        let rows = code
            .to_vec2::<f32>()
            .map_err(|e| CompressorError::Training(e.to_string()))?;
        Ok(rows.into_iter().flatten().collect())
    }

    /// Persist encoder and decoder weights (safetensors).
    pub fn save(&self, path: &Path) -> Result<(), CompressorError> {
        self.varmap
            .save(path)
            .map_err(|e| CompressorError::Persistence(e.to_string()))
    }

    /// Reload a compressor; reproduces `encode` output bit-for-bit.
    pub fn load(
        path: &Path,
        input_dim: usize,
        encoding_dim: usize,
    ) -> Result<Self, CompressorError> {
        if encoding_dim == 0 || encoding_dim >= input_dim {
            return Err(CompressorError::Configuration(format!(
                "encoding_dim ({}) must lie in [1, input_dim) with input_dim {}",
                encoding_dim, input_dim
            )));
        }
        if !path.exists() {
            return Err(CompressorError::Persistence(format!(
                "compressor weights not found: {}",
                path.display()
            )));
        }
        let mut model = Self::build(input_dim, encoding_dim, Device::Cpu)
            .map_err(|e| CompressorError::CorruptArtifact(e.to_string()))?;
        model.varmap.load(path).map_err(|e| {
            CompressorError::CorruptArtifact(format!(
                "failed to load compressor weights from {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(model)
    }
}
