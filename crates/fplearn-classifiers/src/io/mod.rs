//! IO utilities for reading compound tables and writing run outputs.

pub mod compound_csv;
pub mod predictions;

pub use compound_csv::{read_compound_csv, read_compound_csv_with_config, CompoundReaderConfig, CompoundTable};
pub use predictions::{write_metrics_report, write_predictions_csv, Prediction};
