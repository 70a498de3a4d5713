use connectors::{error::AdapterError, sql::base::error::DbError};
use engine_core::error::WatermarkError;
use thiserror::Error;

/// Why a single table run failed. The `Display` text ends up in
/// `TransferSummary::error_message`.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source or destination could not be opened.
    #[error("Connection error: {0}")]
    Connection(#[from] AdapterError),

    /// Bad predicate, missing column or unusable cursor type.
    #[error("Query error: {0}")]
    Query(#[source] DbError),

    /// Extraction or bulk write failed inside the batch loop. Earlier
    /// batches stay in the destination.
    #[error("Batch {batch} failed: {source}")]
    PartialBatch {
        batch: u64,
        #[source]
        source: DbError,
    },

    /// Rows were copied but the checkpoint could not be advanced.
    #[error("Watermark write failed: {0}")]
    WatermarkWrite(#[source] WatermarkError),

    #[error("transfer cancelled")]
    Cancelled,

    /// The table's task panicked before it could report.
    #[error("transfer task aborted")]
    Aborted,
}

impl TransferError {
    /// Classifies a failure raised while copying batch `batch`.
    pub fn from_batch(batch: u64, error: DbError) -> Self {
        match error {
            DbError::CursorType(_) | DbError::UnsupportedType { .. } => TransferError::Query(error),
            source => TransferError::PartialBatch { batch, source },
        }
    }
}

/// Errors that stop a whole invocation before any table runs.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Watermark store unavailable: {0}")]
    Store(#[from] WatermarkError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::transfer::watermark::CursorTypeError;

    #[test]
    fn cursor_problems_are_query_errors() {
        let err = TransferError::from_batch(
            2,
            DbError::CursorType(CursorTypeError {
                column: "Id".into(),
                type_name: "bigint",
            }),
        );
        assert!(matches!(err, TransferError::Query(_)));
    }

    #[test]
    fn write_failures_name_the_batch() {
        let err = TransferError::from_batch(3, DbError::Write("connection reset".into()));
        assert_eq!(err.to_string(), "Batch 3 failed: Write error: connection reset");
    }

    #[test]
    fn cancelled_message() {
        assert_eq!(TransferError::Cancelled.to_string(), "transfer cancelled");
    }
}
