//! Error types for scorecast

use thiserror::Error;

/// Result type alias for scorecast operations
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for ScoreError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScoreError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ScoreError {
    fn from(err: serde_json::Error) -> Self {
        ScoreError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ScoreError {
    fn from(err: ndarray::ShapeError) -> Self {
        ScoreError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
