use crate::sql::base::error::DbError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use model::{
    records::row::RowData,
    transfer::{key::TableKey, watermark::Watermark},
};
use planner::query::generator::WindowSpec;

/// Rows of one batch window, in window order.
pub type RowStream<'a> = BoxStream<'a, Result<RowData, DbError>>;

/// Read side of a replication stream.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Rows with cursor strictly greater than `watermark` that pass `filter`.
    async fn count_pending(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> Result<u64, DbError>;

    /// Opens one ordered window of pending rows.
    async fn fetch_window<'a>(&'a self, spec: &WindowSpec<'_>) -> Result<RowStream<'a>, DbError>;

    /// Round-trips a trivial statement.
    async fn ping(&self) -> Result<(), DbError>;

    fn name(&self) -> &'static str;
}
