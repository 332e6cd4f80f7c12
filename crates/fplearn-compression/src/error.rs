use std::error::Error;
use std::fmt;

/// Failure taxonomy for compressor training and persistence.
#[derive(Debug, Clone)]
pub enum CompressorError {
    Configuration(String),
    Training(String),
    Persistence(String),
    CorruptArtifact(String),
}

impl fmt::Display for CompressorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressorError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            CompressorError::Training(msg) => write!(f, "compressor training failed: {}", msg),
            CompressorError::Persistence(msg) => {
                write!(f, "compressor persistence failed: {}", msg)
            }
            CompressorError::CorruptArtifact(msg) => {
                write!(f, "corrupt compressor artifact: {}", msg)
            }
        }
    }
}

impl Error for CompressorError {}
