use std::error::Error;
use std::fmt;

/// Failure taxonomy for the training pipeline.
///
/// `Configuration` aborts a run before any work starts. `InsufficientData`
/// skips the affected label while the run continues. `Training` marks a
/// single fold (or a whole label/representation when every fold failed).
/// `Persistence` and `CorruptArtifact` are fatal for the affected artifact
/// only.
#[derive(Debug, Clone)]
pub enum PipelineError {
    Configuration(String),
    InsufficientData(String),
    Training(String),
    Persistence(String),
    CorruptArtifact(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            PipelineError::InsufficientData(msg) => write!(f, "insufficient data: {}", msg),
            PipelineError::Training(msg) => write!(f, "training failed: {}", msg),
            PipelineError::Persistence(msg) => write!(f, "artifact persistence failed: {}", msg),
            PipelineError::CorruptArtifact(msg) => write!(f, "corrupt artifact: {}", msg),
        }
    }
}

impl Error for PipelineError {}
