use thiserror::Error;

/// Failures at the I/O seams. Data-quality problems never surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Data source unavailable: {0}")]
    Source(String),
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Validation failed: {0}")]
    Validation(String),
}
