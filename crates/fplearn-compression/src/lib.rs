//! fplearn-compression: unsupervised fingerprint compression.
//!
//! A single autoencoder is trained once per run on the full unlabeled
//! fingerprint population and then applied read-only by every downstream
//! classifier. Only the encoder half is exposed after training.
pub mod autoencoder;
pub mod error;

pub use autoencoder::{Autoencoder, CompressorConfig};
pub use error::CompressorError;
