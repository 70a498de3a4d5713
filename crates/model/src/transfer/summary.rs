use crate::transfer::watermark::Watermark;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of one `transfer_table` run, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub schema_name: String,
    pub table_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub total_rows_to_process: u64,
    pub rows_processed: u64,
    pub batches_processed: u64,
    pub rows_per_second: f64,
    pub success: bool,
    pub error_message: Option<String>,
    /// Watermark written by this run, if any.
    pub committed_watermark: Option<Watermark>,
    pub test_mode: bool,
}

impl TransferSummary {
    pub fn new(schema_name: &str, table_name: &str, start_time: DateTime<Utc>) -> Self {
        TransferSummary {
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            start_time,
            end_time: start_time,
            elapsed_ms: 0,
            total_rows_to_process: 0,
            rows_processed: 0,
            batches_processed: 0,
            rows_per_second: 0.0,
            success: false,
            error_message: None,
            committed_watermark: None,
            test_mode: false,
        }
    }

    /// Stamps end time, elapsed time and throughput.
    pub fn finalize(&mut self, end_time: DateTime<Utc>, elapsed: Duration) {
        self.end_time = end_time;
        self.elapsed_ms = elapsed.as_millis() as u64;
        self.rows_per_second = rows_per_second(self.rows_processed, elapsed);
    }

    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

/// Rows divided by elapsed seconds; 0 when no time has elapsed.
pub fn rows_per_second(rows: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { rows as f64 / secs } else { 0.0 }
}
