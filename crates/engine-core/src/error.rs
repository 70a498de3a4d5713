use connectors::sql::base::error::{ConnectorError, describe_pg_error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Failed to connect to watermark store: {0}")]
    Connect(#[from] ConnectorError),

    #[error("Watermark query failed: {}", describe_pg_error(.0))]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Watermark storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Failed to encode watermark record: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Watermark store error: {0}")]
    Other(String),
}
