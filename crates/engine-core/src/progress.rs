use model::transfer::{key::TableKey, summary::rows_per_second};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Throughput snapshot after a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub batch_no: u64,
    pub rows_done: u64,
    pub rows_total: u64,
    pub percent: f64,
    pub cumulative_rps: f64,
    pub batch_rps: f64,
}

impl ProgressReport {
    pub fn compute(
        batch_no: u64,
        rows_done: u64,
        rows_total: u64,
        cumulative_elapsed: Duration,
        batch_elapsed: Duration,
        batch_rows: u64,
    ) -> Self {
        let percent = if rows_total == 0 {
            100.0
        } else {
            (rows_done as f64 * 100.0 / rows_total as f64).min(100.0)
        };

        ProgressReport {
            batch_no,
            rows_done,
            rows_total,
            percent,
            cumulative_rps: rows_per_second(rows_done, cumulative_elapsed),
            batch_rps: rows_per_second(batch_rows, batch_elapsed),
        }
    }
}

/// Whether a report is due after `batch_no` (1-based).
pub fn is_due(batch_no: u64, frequency: u64, last_batch: bool) -> bool {
    last_batch || (frequency > 0 && batch_no % frequency == 0)
}

/// Computes and logs one progress line.
pub fn report(
    key: &TableKey,
    batch_no: u64,
    rows_done: u64,
    rows_total: u64,
    cumulative_elapsed: Duration,
    batch_elapsed: Duration,
    batch_rows: u64,
) -> ProgressReport {
    let progress = ProgressReport::compute(
        batch_no,
        rows_done,
        rows_total,
        cumulative_elapsed,
        batch_elapsed,
        batch_rows,
    );

    info!(
        table = %key,
        batch = progress.batch_no,
        rows = progress.rows_done,
        total = progress.rows_total,
        "Progress {:.1}% | {:.0} rows/s overall | {:.0} rows/s last batch",
        progress.percent,
        progress.cumulative_rps,
        progress.batch_rps,
    );

    progress
}
