use crate::error::WatermarkError;
use async_trait::async_trait;
use model::transfer::{
    key::TableKey,
    watermark::{Watermark, WatermarkRecord},
};
use tracing::warn;

pub mod postgres;
pub mod sled_store;

/// Durable per-`TableKey` checkpoint. Stored values never move backwards.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Creates the backing storage if absent. Safe to call repeatedly.
    async fn ensure_tracking_table(&self) -> Result<(), WatermarkError>;

    async fn read_watermark(&self, key: &TableKey) -> Result<Option<Watermark>, WatermarkError>;

    /// Upserts the record and stamps `last_updated`. A value older than the
    /// stored one leaves `last_value` unchanged.
    async fn set_watermark(&self, key: &TableKey, value: Watermark) -> Result<(), WatermarkError>;

    async fn list(&self) -> Result<Vec<WatermarkRecord>, WatermarkError>;

    /// Last committed value, or `None` when never run. Read failures also
    /// yield `None`, which forces a full re-scan instead of skipping rows.
    async fn get_watermark(&self, key: &TableKey) -> Option<Watermark> {
        match self.read_watermark(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(table = %key, %error, "Watermark read failed, falling back to full scan");
                None
            }
        }
    }
}
