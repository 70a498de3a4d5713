use crate::query::ast::{common::TableRef, copy::CopyFrom};

#[derive(Debug, Clone)]
pub struct CopyBuilder {
    ast: CopyFrom,
}

impl CopyBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: CopyFrom {
                table,
                columns: Vec::new(),
                options: Vec::new(),
            },
        }
    }

    pub fn columns(mut self, columns: &[String]) -> Self {
        self.ast.columns = columns.to_vec();
        self
    }

    /// Appends `key value` to the `WITH (...)` list, in call order.
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.ast.options.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> CopyFrom {
        self.ast
    }
}
