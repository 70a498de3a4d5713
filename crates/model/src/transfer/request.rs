use crate::transfer::key::TableKey;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 5000;
pub const DEFAULT_REPORTING_FREQUENCY: usize = 5;

/// How rows land in the destination table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WriteMode {
    /// Plain bulk copy. Re-running from an old watermark duplicates rows.
    #[default]
    Append,
    /// Bulk copy into a staging table, then insert-or-update on `keys`.
    /// Safe to repeat.
    Upsert { keys: Vec<String> },
}

/// Everything needed to replicate one table.
///
/// OFFSET pagination needs a stable total order: when the cursor column
/// holds duplicate values, a tie group that straddles the end of a run can
/// be skipped by the next run, since it only reads rows strictly after the
/// committed watermark. Use a unique cursor where that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub schema_name: String,
    pub table_name: String,
    pub cursor_column: String,
    /// Backend-native boolean expression ANDed into every query.
    pub filter: Option<String>,
    /// Sort column for batch windows; the cursor column when absent.
    pub order_by: Option<String>,
    pub batch_size: usize,
    /// Batches between progress reports.
    pub reporting_frequency: usize,
    /// Extract and count only: no destination writes, no watermark commit.
    pub test_mode: bool,
    pub write_mode: WriteMode,
    pub target_schema: Option<String>,
    pub target_table: Option<String>,
}

impl TransferRequest {
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        cursor_column: impl Into<String>,
    ) -> Self {
        TransferRequest {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            cursor_column: cursor_column.into(),
            filter: None,
            order_by: None,
            batch_size: DEFAULT_BATCH_SIZE,
            reporting_frequency: DEFAULT_REPORTING_FREQUENCY,
            test_mode: false,
            write_mode: WriteMode::Append,
            target_schema: None,
            target_table: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_reporting_frequency(mut self, frequency: usize) -> Self {
        self.reporting_frequency = frequency;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_target(mut self, schema: Option<String>, table: Option<String>) -> Self {
        self.target_schema = schema;
        self.target_table = table;
        self
    }

    pub fn key(&self) -> TableKey {
        TableKey::new(&self.schema_name, &self.table_name, &self.cursor_column)
    }

    pub fn order_by_column(&self) -> &str {
        self.order_by.as_deref().unwrap_or(&self.cursor_column)
    }

    pub fn target_schema(&self) -> &str {
        self.target_schema.as_deref().unwrap_or(&self.schema_name)
    }

    pub fn target_table(&self) -> &str {
        self.target_table.as_deref().unwrap_or(&self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_source_table() {
        let req = TransferRequest::new("dbo", "Orders", "UpdatedAt");
        assert_eq!(req.batch_size, 5000);
        assert_eq!(req.reporting_frequency, 5);
        assert!(!req.test_mode);
        assert_eq!(req.order_by_column(), "UpdatedAt");
        assert_eq!(req.target_schema(), "dbo");
        assert_eq!(req.target_table(), "Orders");
        assert_eq!(req.write_mode, WriteMode::Append);
    }

    #[test]
    fn overrides_apply() {
        let req = TransferRequest::new("dbo", "Orders", "UpdatedAt")
            .with_order_by("Id")
            .with_target(Some("public".into()), Some("orders".into()));
        assert_eq!(req.order_by_column(), "Id");
        assert_eq!(req.target_schema(), "public");
        assert_eq!(req.target_table(), "orders");
        assert_eq!(req.key().to_string(), "dbo.Orders(UpdatedAt)");
    }
}
