use crate::{sql::base::error::DbError, source::RowStream};
use async_trait::async_trait;
use model::transfer::request::WriteMode;
use planner::query::ast::common::TableRef;

/// Write side of a replication stream.
#[async_trait]
pub trait RowSink: Send {
    /// Writes every row of `rows` into `target` atomically: either all rows
    /// become visible or none do. Returns the number of rows written.
    ///
    /// The stream is consumed to the end or to its first error; an error
    /// from the stream aborts the write.
    async fn write_rows(
        &mut self,
        target: &TableRef,
        mode: &WriteMode,
        rows: RowStream<'_>,
    ) -> Result<u64, DbError>;

    async fn ping(&self) -> Result<(), DbError>;
}
