use connectors::{
    sink::RowSink,
    source::{RowSource, RowStream},
    sql::base::error::DbError,
};
use engine_core::metrics::Metrics;
use futures_util::{StreamExt, TryStreamExt, future};
use model::{
    records::row::RowData,
    transfer::{batch::BatchResult, request::WriteMode, watermark::Watermark},
};
use planner::query::{ast::common::TableRef, generator::WindowSpec};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// What the tee saw while rows flowed through it.
#[derive(Debug, Default)]
struct Tally {
    rows: u64,
    bytes: u64,
    high: Option<Watermark>,
}

/// Moves one window from source to destination in a single pass.
pub struct BatchCopier<'a> {
    source: &'a dyn RowSource,
    sink: &'a mut dyn RowSink,
    target: TableRef,
    mode: &'a WriteMode,
    metrics: Metrics,
}

impl<'a> BatchCopier<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        sink: &'a mut dyn RowSink,
        target: TableRef,
        mode: &'a WriteMode,
        metrics: Metrics,
    ) -> Self {
        BatchCopier {
            source,
            sink,
            target,
            mode,
            metrics,
        }
    }

    /// Fetches the window described by `spec` and bulk-writes it, counting
    /// rows and tracking the highest cursor value on the way through. In
    /// test mode the rows are read and counted but dropped.
    pub async fn fetch_and_copy(
        &mut self,
        spec: &WindowSpec<'_>,
        test_mode: bool,
    ) -> Result<BatchResult, DbError> {
        let tally = Mutex::new(Tally::default());
        let rows = self.source.fetch_window(spec).await?;
        let rows = tee(rows, &spec.key.cursor_column, &tally);

        let written = if test_mode {
            rows.try_for_each(|_| future::ready(Ok(()))).await?;
            None
        } else {
            Some(self.sink.write_rows(&self.target, self.mode, rows).await?)
        };

        let tally = tally.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(written) = written
            && written != tally.rows
        {
            warn!(
                table = %spec.key,
                fetched = tally.rows,
                written,
                "Destination row count differs from fetched rows"
            );
        }

        self.metrics.increment_bytes(tally.bytes);
        debug!(
            table = %spec.key,
            offset = spec.offset,
            limit = spec.limit,
            rows = tally.rows,
            test_mode,
            "Window copied"
        );

        Ok(BatchResult::new(tally.rows, tally.high))
    }
}

/// Forwards rows unchanged while folding count, size and max cursor into
/// `tally`. A cursor value that is not a date or timestamp fails the stream,
/// which aborts the destination write.
fn tee<'s>(rows: RowStream<'s>, cursor: &'s str, tally: &'s Mutex<Tally>) -> RowStream<'s> {
    rows.map(
        move |row: Result<RowData, DbError>| -> Result<RowData, DbError> {
            let row = row?;
            let high = Watermark::from_value(cursor, &row.get_value(cursor))?;

            let mut tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
            tally.rows += 1;
            tally.bytes += row.size_bytes() as u64;
            tally.high = Watermark::max_of(tally.high, high);
            Ok(row)
        },
    )
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::{FakeSink, FakeSource, row};
    use model::{core::value::Value, transfer::key::TableKey};

    fn spec<'a>(key: &'a TableKey, offset: u64, limit: u64) -> WindowSpec<'a> {
        WindowSpec {
            key,
            watermark: None,
            filter: None,
            order_by: &key.cursor_column,
            offset,
            limit,
        }
    }

    #[tokio::test]
    async fn single_pass_counts_and_tracks_max_cursor() {
        let source = FakeSource::new((1..=5).map(|i| row(i, i as u32, "Active")).collect());
        let mut sink = FakeSink::default();
        let key = TableKey::new("dbo", "Orders", "UpdatedAt");
        let mode = WriteMode::Append;
        let metrics = Metrics::new();

        let mut copier = BatchCopier::new(
            &source,
            &mut sink,
            TableRef::new("dbo", "Orders"),
            &mode,
            metrics.clone(),
        );
        let result = copier.fetch_and_copy(&spec(&key, 1, 3), false).await.unwrap();

        assert_eq!(result.rows_in_batch, 3);
        assert_eq!(
            result.batch_high_watermark,
            Watermark::from_value("UpdatedAt", &row(4, 4, "Active").get_value("UpdatedAt"))
                .unwrap()
        );
        assert_eq!(source.window_calls(), vec![(1, 3)]);
        assert_eq!(sink.written().len(), 3);
        assert!(metrics.snapshot().bytes_transferred > 0);
    }

    #[tokio::test]
    async fn test_mode_reads_but_never_writes() {
        let source = FakeSource::new((1..=4).map(|i| row(i, i as u32, "Active")).collect());
        let mut sink = FakeSink::default();
        let key = TableKey::new("dbo", "Orders", "UpdatedAt");
        let mode = WriteMode::Append;

        let mut copier = BatchCopier::new(
            &source,
            &mut sink,
            TableRef::new("dbo", "Orders"),
            &mode,
            Metrics::new(),
        );
        let result = copier.fetch_and_copy(&spec(&key, 0, 10), true).await.unwrap();

        assert_eq!(result.rows_in_batch, 4);
        assert!(result.batch_high_watermark.is_some());
        assert_eq!(sink.write_calls(), 0);
    }

    #[tokio::test]
    async fn null_cursors_leave_no_high_watermark() {
        let mut r = row(1, 1, "Active");
        r.field_values[1].value = Some(Value::Null);
        let source = FakeSource::new(vec![r]);
        let mut sink = FakeSink::default();
        let key = TableKey::new("dbo", "Orders", "UpdatedAt");
        let mode = WriteMode::Append;

        let mut copier = BatchCopier::new(
            &source,
            &mut sink,
            TableRef::new("dbo", "Orders"),
            &mode,
            Metrics::new(),
        );
        let result = copier.fetch_and_copy(&spec(&key, 0, 10), false).await.unwrap();
        assert_eq!(result, BatchResult::new(1, None));
    }

    #[tokio::test]
    async fn non_temporal_cursor_aborts_the_write() {
        let source = FakeSource::new((1..=3).map(|i| row(i, i as u32, "Active")).collect());
        let mut sink = FakeSink::default();
        let key = TableKey::new("dbo", "Orders", "Id");
        let mode = WriteMode::Append;

        let mut copier = BatchCopier::new(
            &source,
            &mut sink,
            TableRef::new("dbo", "Orders"),
            &mode,
            Metrics::new(),
        );
        let err = copier.fetch_and_copy(&spec(&key, 0, 10), false).await.unwrap_err();
        assert!(matches!(err, DbError::CursorType(_)));
        assert!(sink.written().is_empty());
    }
}
