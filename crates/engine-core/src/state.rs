//! Explicit run state for one table transfer.
//!
//! Every transition consumes the state and returns the next one, so the
//! orchestration loop can be checked step by step without any I/O.

use model::transfer::{batch::BatchResult, watermark::Watermark};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferPhase {
    Init,
    WatermarkLoaded,
    Counted,
    BatchLoop,
    Commit,
    Done,
    Failed,
}

impl TransferPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Init => "INIT",
            TransferPhase::WatermarkLoaded => "WATERMARK_LOADED",
            TransferPhase::Counted => "COUNTED",
            TransferPhase::BatchLoop => "BATCH_LOOP",
            TransferPhase::Commit => "COMMIT",
            TransferPhase::Done => "DONE",
            TransferPhase::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferPhase::Done | TransferPhase::Failed)
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferState {
    pub phase: TransferPhase,
    /// Watermark in effect when the run started.
    pub watermark: Option<Watermark>,
    /// Pending rows counted once before the loop.
    pub total_rows: u64,
    pub offset: u64,
    pub rows_processed: u64,
    pub batches: u64,
    /// Highest cursor value seen so far in this run.
    pub candidate: Option<Watermark>,
    /// Set when a window came back empty; the source shrank under us.
    pub exhausted: bool,
    pub error: Option<String>,
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferState {
    pub fn new() -> Self {
        TransferState {
            phase: TransferPhase::Init,
            watermark: None,
            total_rows: 0,
            offset: 0,
            rows_processed: 0,
            batches: 0,
            candidate: None,
            exhausted: false,
            error: None,
        }
    }

    pub fn watermark_loaded(self, watermark: Option<Watermark>) -> Self {
        TransferState {
            phase: TransferPhase::WatermarkLoaded,
            watermark,
            ..self
        }
    }

    /// Nothing pending goes straight to `Done` without touching the watermark.
    pub fn counted(self, total_rows: u64) -> Self {
        let phase = if total_rows == 0 {
            TransferPhase::Done
        } else {
            TransferPhase::Counted
        };
        TransferState {
            phase,
            total_rows,
            ..self
        }
    }

    /// Size of the next window, or `None` once the counted rows are covered.
    /// Never reaches past the count taken before the loop.
    pub fn next_window(&self, batch_size: u64) -> Option<u64> {
        if self.phase.is_terminal() || self.exhausted || self.offset >= self.total_rows {
            return None;
        }
        Some(batch_size.max(1).min(self.total_rows - self.offset))
    }

    pub fn batch_completed(self, result: BatchResult) -> Self {
        TransferState {
            phase: TransferPhase::BatchLoop,
            offset: self.offset + result.rows_in_batch,
            rows_processed: self.rows_processed + result.rows_in_batch,
            batches: self.batches + 1,
            candidate: Watermark::max_of(self.candidate, result.batch_high_watermark),
            exhausted: result.is_empty(),
            ..self
        }
    }

    pub fn loop_finished(self) -> Self {
        TransferState {
            phase: TransferPhase::Commit,
            ..self
        }
    }

    /// The value to persist at commit, if any. Test runs never commit.
    pub fn commit_candidate(&self, test_mode: bool) -> Option<Watermark> {
        if test_mode { None } else { self.candidate }
    }

    pub fn committed(self) -> Self {
        TransferState {
            phase: TransferPhase::Done,
            ..self
        }
    }

    /// Absorbing failure; counters keep what was accumulated.
    pub fn failed(self, error: impl fmt::Display) -> Self {
        TransferState {
            phase: TransferPhase::Failed,
            error: Some(error.to_string()),
            ..self
        }
    }

    pub fn succeeded(&self) -> bool {
        self.phase == TransferPhase::Done
    }
}
