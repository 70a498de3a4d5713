use crate::error::ExecutorError;
use async_trait::async_trait;
use connectors::{
    adapter,
    error::AdapterError,
    sink::RowSink,
    source::RowSource,
};
use engine_config::settings::StateBackend;
use engine_core::watermark::{
    WatermarkStore, postgres::PgWatermarkStore, sled_store::SledWatermarkStore,
};
use model::transfer::request::TransferRequest;
use std::sync::Arc;
use tracing::info;

/// Opens the connections one table run needs. Each call yields a fresh
/// connection owned by that run.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn source(&self, request: &TransferRequest) -> Result<Box<dyn RowSource>, AdapterError>;

    async fn sink(&self, request: &TransferRequest) -> Result<Box<dyn RowSink>, AdapterError>;
}

/// Connects by URL, picking the driver from the scheme.
pub struct UrlConnectionFactory {
    source_url: String,
    destination_url: String,
}

impl UrlConnectionFactory {
    pub fn new(source_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        UrlConnectionFactory {
            source_url: source_url.into(),
            destination_url: destination_url.into(),
        }
    }
}

#[async_trait]
impl ConnectionFactory for UrlConnectionFactory {
    async fn source(&self, _request: &TransferRequest) -> Result<Box<dyn RowSource>, AdapterError> {
        adapter::open_source(&self.source_url).await
    }

    async fn sink(&self, _request: &TransferRequest) -> Result<Box<dyn RowSink>, AdapterError> {
        adapter::open_sink(&self.destination_url).await
    }
}

/// Opens the configured watermark store and makes sure its storage exists.
pub async fn open_watermark_store(
    backend: &StateBackend,
    destination_url: &str,
) -> Result<Arc<dyn WatermarkStore>, ExecutorError> {
    let store: Arc<dyn WatermarkStore> = match backend {
        StateBackend::Destination { schema, table } => {
            info!(schema = %schema, table = %table, "Using destination watermark table");
            Arc::new(PgWatermarkStore::connect(destination_url, schema, table).await?)
        }
        StateBackend::Sled { path } => {
            info!(path = %path.display(), "Using local watermark store");
            Arc::new(SledWatermarkStore::open(path)?)
        }
    };

    store.ensure_tracking_table().await?;
    Ok(store)
}
