//! Small ndarray-like containers used throughout the crate.
//!
//! `Array1` and `Array2` are intentionally minimal row-major containers
//! with just the selection and mapping helpers the pipeline needs. Heavy
//! numeric work happens inside the candle models, not here.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
