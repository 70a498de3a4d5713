//! Drives one table through
//! `INIT -> WATERMARK_LOADED -> COUNTED -> BATCH_LOOP -> COMMIT -> DONE`,
//! with `FAILED` reachable from every step.

use crate::{copier::BatchCopier, counter::RowCounter, error::TransferError};
use chrono::Utc;
use connectors::{sink::RowSink, source::RowSource};
use engine_core::{
    metrics::Metrics,
    progress,
    state::{TransferPhase, TransferState},
    watermark::WatermarkStore,
};
use model::transfer::{key::TableKey, request::TransferRequest, summary::TransferSummary};
use planner::query::{ast::common::TableRef, generator::WindowSpec};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Orchestrator<'a> {
    source: &'a dyn RowSource,
    sink: &'a mut dyn RowSink,
    store: &'a dyn WatermarkStore,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        sink: &'a mut dyn RowSink,
        store: &'a dyn WatermarkStore,
    ) -> Self {
        Orchestrator {
            source,
            sink,
            store,
            metrics: Metrics::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replicates one table and reports how it went. Never returns an
    /// error: failures are carried in the summary, and the stored watermark
    /// only moves when every step succeeded.
    pub async fn transfer_table(&mut self, request: &TransferRequest) -> TransferSummary {
        let started = Instant::now();
        let mut summary =
            TransferSummary::new(&request.schema_name, &request.table_name, Utc::now());
        summary.test_mode = request.test_mode;

        let key = request.key();
        info!(table = %key, test_mode = request.test_mode, "Starting transfer");

        let state = self.run(request, &key, started).await;

        summary.total_rows_to_process = state.total_rows;
        summary.rows_processed = state.rows_processed;
        summary.batches_processed = state.batches;
        summary.success = state.succeeded();
        summary.error_message = state.error.clone();
        if state.succeeded() {
            summary.committed_watermark = state.commit_candidate(request.test_mode);
        }
        summary.finalize(Utc::now(), started.elapsed());

        if summary.success {
            info!(
                table = %key,
                rows = summary.rows_processed,
                batches = summary.batches_processed,
                elapsed_ms = summary.elapsed_ms,
                watermark = ?summary.committed_watermark.map(|w| w.to_string()),
                "Transfer completed"
            );
        } else {
            error!(
                table = %key,
                rows = summary.rows_processed,
                phase = %state.phase,
                error = summary.error_message.as_deref().unwrap_or_default(),
                "Transfer failed"
            );
        }
        summary
    }

    async fn run(
        &mut self,
        request: &TransferRequest,
        key: &TableKey,
        started: Instant,
    ) -> TransferState {
        let state = TransferState::new();
        if self.cancel.is_cancelled() {
            return state.failed(TransferError::Cancelled);
        }

        let state = state.watermark_loaded(self.store.get_watermark(key).await);
        let watermark = state.watermark;
        let filter = request.filter.as_deref();

        let total = match RowCounter::new(self.source)
            .count_pending(key, watermark.as_ref(), filter)
            .await
        {
            Ok(total) => total,
            Err(e) => return state.failed(e),
        };

        let mut state = state.counted(total);
        if state.phase == TransferPhase::Done {
            info!(table = %key, "No pending rows");
            return state;
        }
        info!(table = %key, pending = total, "Counted pending rows");

        let batch_size = request.batch_size as u64;
        let frequency = request.reporting_frequency as u64;
        let target = TableRef::new(request.target_schema(), request.target_table());
        let mut copier = BatchCopier::new(
            self.source,
            &mut *self.sink,
            target,
            &request.write_mode,
            self.metrics.clone(),
        );

        while let Some(limit) = state.next_window(batch_size) {
            if self.cancel.is_cancelled() {
                return state.failed(TransferError::Cancelled);
            }

            let batch_no = state.batches + 1;
            let spec = WindowSpec {
                key,
                watermark: watermark.as_ref(),
                filter,
                order_by: request.order_by_column(),
                offset: state.offset,
                limit,
            };

            let batch_started = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(TransferError::Cancelled),
                result = copier.fetch_and_copy(&spec, request.test_mode) => {
                    result.map_err(|e| TransferError::from_batch(batch_no, e))
                }
            };
            let result = match outcome {
                Ok(result) => result,
                Err(e) => return state.failed(e),
            };

            self.metrics.increment_rows(result.rows_in_batch);
            self.metrics.increment_batches(1);
            state = state.batch_completed(result);

            if result.is_empty() {
                warn!(
                    table = %key,
                    offset = state.offset,
                    expected = state.total_rows,
                    "Window came back empty, source has fewer rows than counted"
                );
            }

            let last = state.next_window(batch_size).is_none();
            if progress::is_due(state.batches, frequency, last) {
                progress::report(
                    key,
                    state.batches,
                    state.rows_processed,
                    state.total_rows,
                    started.elapsed(),
                    batch_started.elapsed(),
                    result.rows_in_batch,
                );
            }
        }

        let state = state.loop_finished();
        if self.cancel.is_cancelled() {
            return state.failed(TransferError::Cancelled);
        }

        match state.commit_candidate(request.test_mode) {
            Some(candidate) => match self.store.set_watermark(key, candidate).await {
                Ok(()) => state.committed(),
                Err(e) => state.failed(TransferError::WatermarkWrite(e)),
            },
            None => {
                if request.test_mode {
                    info!(table = %key, "Test mode, watermark not committed");
                } else {
                    warn!(table = %key, "No cursor values seen, watermark unchanged");
                }
                state.committed()
            }
        }
    }
}

/// Summary for a run that could not start, e.g. when a connection fails.
pub fn failed_summary(request: &TransferRequest, error: &TransferError) -> TransferSummary {
    let now = Utc::now();
    let mut summary = TransferSummary::new(&request.schema_name, &request.table_name, now);
    summary.test_mode = request.test_mode;
    summary.error_message = Some(error.to_string());
    summary.finalize(now, std::time::Duration::ZERO);
    summary
}
