use connectors::{error::AdapterError, sql::base::error::DbError};
use engine_config::error::ConfigError;
use engine_core::error::WatermarkError;
use engine_runtime::error::ExecutorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load the configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to run transfers: {0}")]
    Runner(#[from] ExecutorError),

    #[error("Failed to read watermarks: {0}")]
    Watermark(#[from] WatermarkError),

    #[error("Failed to connect: {0}")]
    Connection(#[from] AdapterError),

    #[error("Connection check failed: {0}")]
    Database(#[from] DbError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid connection kind provided: {0}")]
    InvalidConnectionKind(String),

    #[error("URL is for {actual}, but --kind says {expected}")]
    KindMismatch { expected: String, actual: String },
}
