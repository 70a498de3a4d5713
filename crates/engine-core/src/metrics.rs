use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_copied: AtomicU64,
    bytes_transferred: AtomicU64,
    batches_processed: AtomicU64,
    tables_succeeded: AtomicU64,
    tables_failed: AtomicU64,
}

/// Run-wide counters shared by every table task of one invocation.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_copied: u64,
    pub bytes_transferred: u64,
    pub batches_processed: u64,
    pub tables_succeeded: u64,
    pub tables_failed: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_copied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner
            .bytes_transferred
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner
            .batches_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_table(&self, success: bool) {
        let counter = if success {
            &self.inner.tables_succeeded
        } else {
            &self.inner.tables_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_copied: self.inner.rows_copied.load(Ordering::Relaxed),
            bytes_transferred: self.inner.bytes_transferred.load(Ordering::Relaxed),
            batches_processed: self.inner.batches_processed.load(Ordering::Relaxed),
            tables_succeeded: self.inner.tables_succeeded.load(Ordering::Relaxed),
            tables_failed: self.inner.tables_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let other = metrics.clone();
        metrics.increment_rows(10);
        other.increment_rows(5);
        other.increment_batches(2);
        metrics.record_table(true);
        other.record_table(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_copied, 15);
        assert_eq!(snap.batches_processed, 2);
        assert_eq!(snap.tables_succeeded, 1);
        assert_eq!(snap.tables_failed, 1);
    }
}
