use crate::error::TransferError;
use connectors::source::RowSource;
use model::transfer::{key::TableKey, watermark::Watermark};
use tracing::debug;

/// Sizes the batch loop. The count is taken once per run; rows that arrive
/// afterwards are left for the next run.
pub struct RowCounter<'a> {
    source: &'a dyn RowSource,
}

impl<'a> RowCounter<'a> {
    pub fn new(source: &'a dyn RowSource) -> Self {
        RowCounter { source }
    }

    pub async fn count_pending(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> Result<u64, TransferError> {
        let pending = self
            .source
            .count_pending(key, watermark, filter)
            .await
            .map_err(TransferError::Query)?;

        debug!(
            table = %key,
            source = self.source.name(),
            watermark = ?watermark.map(ToString::to_string),
            pending,
            "Counted pending rows"
        );
        Ok(pending)
    }
}
