//! Error types for the forecasting pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Upstream AQI API unreachable or returned a malformed payload
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// No usable rows for training after filtering
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// A candidate regressor failed to fit or predict
    #[error("Training error in candidate '{candidate}': {reason}")]
    Training { candidate: String, reason: String },

    /// No persisted model exists for inference
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// No feature rows available for inference
    #[error("No data: {0}")]
    NoData(String),

    /// Feature vector at predict time does not match the trained column order
    #[error("Feature mismatch: model expects [{}], got [{}]", expected.join(", "), actual.join(", "))]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Table not found: {name} (version {version})")]
    TableNotFound { name: String, version: u32 },

    #[error("Incomplete features at {timestamp}: missing {column}")]
    IncompleteFeatures { timestamp: String, column: String },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ForecastError {
    /// Wrap any error raised while fitting or scoring a candidate
    pub fn training(candidate: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ForecastError::Training {
            candidate: candidate.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for ForecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ForecastError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::Fetch(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
