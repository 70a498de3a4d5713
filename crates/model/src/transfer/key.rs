use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one replication stream: a source table paired with the
/// column used to detect new rows. Immutable for the length of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub schema_name: String,
    pub table_name: String,
    pub cursor_column: String,
}

impl TableKey {
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        cursor_column: impl Into<String>,
    ) -> Self {
        TableKey {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            cursor_column: cursor_column.into(),
        }
    }

    /// `schema.table`, without the cursor column.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.schema_name, self.table_name, self.cursor_column
        )
    }
}
