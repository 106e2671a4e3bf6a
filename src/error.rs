//! Error types for the forgeml engine

use thiserror::Error;

/// Result type alias for forgeml operations
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum ForgeError {
    /// A recognized transform step whose parameters cannot be honored
    #[error("Invalid step #{index} ({action}): {reason}")]
    InvalidStep {
        index: usize,
        action: String,
        reason: String,
    },

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid prediction input: {0}")]
    PredictionInput(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

/// Coarse classification of an error for user-facing reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The addressed model does not exist
    NotFound,
    /// The caller supplied something unusable
    BadInput,
    /// Fitting, storage, or another internal failure
    Internal,
}

impl ForgeError {
    /// Build an `InvalidStep` error
    pub fn invalid_step(index: usize, action: impl Into<String>, reason: impl Into<String>) -> Self {
        ForgeError::InvalidStep {
            index,
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Which bucket this error falls into when reported to an end user
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForgeError::ModelNotFound(_) => ErrorCategory::NotFound,
            ForgeError::InvalidStep { .. }
            | ForgeError::UnknownAlgorithm(_)
            | ForgeError::PredictionInput(_)
            | ForgeError::Data(_)
            | ForgeError::Config(_) => ErrorCategory::BadInput,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<polars::error::PolarsError> for ForgeError {
    fn from(err: polars::error::PolarsError) -> Self {
        ForgeError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for ForgeError {
    fn from(err: bincode::Error) -> Self {
        ForgeError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForgeError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForgeError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
