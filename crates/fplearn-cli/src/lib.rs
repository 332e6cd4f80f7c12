//! Library surface of the fplearn command line: configuration loading and
//! the train/predict pipeline entry points.
pub mod predict;
pub mod train;
pub mod util;
