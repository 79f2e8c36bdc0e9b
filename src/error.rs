//! Error types for the tabfit training pipeline

use thiserror::Error;

/// Result type alias for tabfit operations
pub type Result<T> = std::result::Result<T, TabfitError>;

/// Main error type for the training pipeline
#[derive(Error, Debug)]
pub enum TabfitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error for model '{model}': {reason}")]
    TrainingError { model: String, reason: String },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Stage '{stage}' failed: {source}")]
    StageError {
        stage: &'static str,
        #[source]
        source: Box<TabfitError>,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for TabfitError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabfitError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabfitError {
    fn from(err: serde_json::Error) -> Self {
        TabfitError::PersistenceError(err.to_string())
    }
}
