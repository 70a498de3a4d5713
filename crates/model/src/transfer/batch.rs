use crate::transfer::watermark::Watermark;

/// Outcome of copying one batch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub rows_in_batch: u64,
    /// Highest cursor value seen in the window; `None` when every value was NULL.
    pub batch_high_watermark: Option<Watermark>,
}

impl BatchResult {
    pub fn new(rows_in_batch: u64, batch_high_watermark: Option<Watermark>) -> Self {
        BatchResult {
            rows_in_batch,
            batch_high_watermark,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows_in_batch == 0
    }
}
