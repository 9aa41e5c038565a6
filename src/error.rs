use thiserror::Error;

/// Main error type for the trainer and prediction service
#[derive(Error, Debug)]
pub enum TriageError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Dataset errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] crate::dataset::DatasetError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for TriageError
pub type Result<T> = std::result::Result<T, TriageError>;

/// Request-level errors for the predict endpoint.
///
/// The first two variants are client mistakes and map to HTTP 400; `Internal`
/// covers everything the client cannot fix and maps to 500. Every variant
/// renders as a `{"error": ...}` body with the `Display` text as the message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Missing feature: {0}")]
    MissingFeature(&'static str),

    #[error("Invalid value for {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("{0}")]
    Internal(String),
}

impl From<PredictError> for TriageError {
    fn from(err: PredictError) -> Self {
        TriageError::Validation(err.to_string())
    }
}
