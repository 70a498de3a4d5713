//! Defines the AST for a CREATE TABLE statement.

use crate::query::ast::{common::TableRef, expr::Expr};

#[derive(Debug, Clone, Default)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    /// `(LIKE other INCLUDING DEFAULTS)` instead of explicit columns.
    pub like: Option<TableRef>,
    pub if_not_exists: bool,
    pub temp: bool,
    /// `ON COMMIT DROP`, temporary tables only.
    pub drop_on_commit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    Unique { name: String, columns: Vec<String> },
}
