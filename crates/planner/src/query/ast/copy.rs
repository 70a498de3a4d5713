//! `COPY <table> (<columns>) FROM STDIN` statements used for bulk loads.

use crate::query::ast::common::TableRef;

#[derive(Debug, Clone)]
pub struct CopyFrom {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub options: Vec<(String, String)>,
}
