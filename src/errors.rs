use raccoon_config::ConfigError;
use raccoon_core::CoreError;
use thiserror::Error;

/// Failures surfaced by the report binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Bad command line; the binary exits with status 2.
    #[error("{0}")]
    Usage(String),
    #[error("Data unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) => 2,
            _ => 1,
        }
    }
}
