//! Builds every statement the replication engine issues.

use crate::query::{
    ast::{
        common::TableRef,
        create_table::{ColumnDef, CreateTable, TableConstraint},
        expr::{BinaryOperator, Expr},
        insert::{ConflictAction, ConflictAssignment, Insert, OnConflict},
        select::Select,
    },
    builder::{copy::CopyBuilder, select::SelectBuilder},
    dialect::Dialect,
    ident, qualified,
    renderer::render,
    value,
};
use model::{
    core::value::Value,
    transfer::{key::TableKey, watermark::Watermark},
};

pub const COL_SCHEMA_NAME: &str = "schema_name";
pub const COL_TABLE_NAME: &str = "table_name";
pub const COL_CURSOR_COLUMN: &str = "cursor_column_name";
pub const COL_LAST_VALUE: &str = "last_value";
pub const COL_LAST_UPDATED: &str = "last_updated";

/// Parameters of one batch window over a source table.
#[derive(Debug, Clone, Copy)]
pub struct WindowSpec<'a> {
    pub key: &'a TableKey,
    pub watermark: Option<&'a Watermark>,
    pub filter: Option<&'a str>,
    pub order_by: &'a str,
    pub offset: u64,
    pub limit: u64,
}

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    fn source_table(key: &TableKey) -> TableRef {
        TableRef::new(&key.schema_name, &key.table_name)
    }

    /// `cursor > watermark AND (filter)`, each part only when present.
    fn pending_predicate(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> Vec<Expr> {
        let mut conditions = Vec::new();
        if let Some(wm) = watermark {
            conditions.push(Expr::binary(
                ident(&key.cursor_column),
                BinaryOperator::Gt,
                self.dialect.watermark_expr(wm),
            ));
        }
        if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
            conditions.push(Expr::Raw(filter.to_string()));
        }
        conditions
    }

    pub fn pending_count(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> (String, Vec<Value>) {
        let select = self
            .pending_predicate(key, watermark, filter)
            .into_iter()
            .fold(
                SelectBuilder::new(Self::source_table(key)).column(Expr::count_star()),
                SelectBuilder::and_where,
            )
            .build();
        render(&select, self.dialect)
    }

    pub fn batch_window(&self, spec: &WindowSpec<'_>) -> (String, Vec<Value>) {
        let mut builder = self
            .pending_predicate(spec.key, spec.watermark, spec.filter)
            .into_iter()
            .fold(
                SelectBuilder::new(Self::source_table(spec.key)),
                SelectBuilder::and_where,
            )
            .order_by_asc(spec.order_by);

        // Secondary key keeps windows stable when the order column has ties.
        if !spec.order_by.eq_ignore_ascii_case(&spec.key.cursor_column) {
            builder = builder.order_by_asc(&spec.key.cursor_column);
        }

        let select = builder.window(spec.offset, spec.limit).build();
        render(&select, self.dialect)
    }

    pub fn copy_from_stdin(&self, table: &TableRef, columns: &[String]) -> String {
        let copy = CopyBuilder::new(table.clone())
            .columns(columns)
            .option("FORMAT", "CSV")
            .option("NULL", "'\\N'")
            .build();
        render(&copy, self.dialect).0
    }

    pub fn create_staging_table(&self, stage: &str, like: &TableRef) -> String {
        let ddl = CreateTable {
            table: TableRef {
                schema: None,
                name: stage.to_string(),
            },
            like: Some(like.clone()),
            temp: true,
            drop_on_commit: true,
            ..Default::default()
        };
        render(&ddl, self.dialect).0
    }

    /// Moves staged rows into `target`, updating rows whose `keys` already exist.
    pub fn merge_from_staging(
        &self,
        target: &TableRef,
        stage: &str,
        columns: &[String],
        keys: &[String],
    ) -> String {
        let select = Select {
            columns: columns.iter().map(|c| ident(c)).collect(),
            from: TableRef {
                schema: None,
                name: stage.to_string(),
            },
            ..Default::default()
        };

        let assignments: Vec<ConflictAssignment> = columns
            .iter()
            .filter(|c| !keys.iter().any(|k| k.eq_ignore_ascii_case(c)))
            .map(|c| ConflictAssignment {
                column: c.clone(),
                value: excluded(c),
            })
            .collect();

        let action = if assignments.is_empty() {
            ConflictAction::DoNothing
        } else {
            ConflictAction::DoUpdate { assignments }
        };

        let insert = Insert {
            table: target.clone(),
            columns: columns.to_vec(),
            values: Vec::new(),
            select: Some(select),
            on_conflict: Some(OnConflict {
                columns: keys.to_vec(),
                action,
            }),
        };
        render(&insert, self.dialect).0
    }

    pub fn create_watermark_table(&self, table: &TableRef) -> String {
        let text_col = |name: &str| ColumnDef {
            name: name.to_string(),
            data_type: "TEXT".to_string(),
            is_nullable: false,
            default_value: None,
        };

        let ddl = CreateTable {
            table: table.clone(),
            columns: vec![
                text_col(COL_SCHEMA_NAME),
                text_col(COL_TABLE_NAME),
                text_col(COL_CURSOR_COLUMN),
                ColumnDef {
                    name: COL_LAST_VALUE.to_string(),
                    data_type: "TIMESTAMPTZ".to_string(),
                    is_nullable: false,
                    default_value: None,
                },
                ColumnDef {
                    name: COL_LAST_UPDATED.to_string(),
                    data_type: "TIMESTAMPTZ".to_string(),
                    is_nullable: false,
                    default_value: Some(now()),
                },
            ],
            constraints: vec![TableConstraint::Unique {
                name: format!("{}_key", table.name),
                columns: key_columns(),
            }],
            if_not_exists: true,
            ..Default::default()
        };
        render(&ddl, self.dialect).0
    }

    pub fn select_watermark(&self, table: &TableRef, key: &TableKey) -> (String, Vec<Value>) {
        let select = SelectBuilder::new(table.clone())
            .column(ident(COL_LAST_VALUE))
            .and_where(key_match(COL_SCHEMA_NAME, &key.schema_name))
            .and_where(key_match(COL_TABLE_NAME, &key.table_name))
            .and_where(key_match(COL_CURSOR_COLUMN, &key.cursor_column))
            .build();
        render(&select, self.dialect)
    }

    pub fn list_watermarks(&self, table: &TableRef) -> String {
        let select = SelectBuilder::new(table.clone())
            .column(ident(COL_SCHEMA_NAME))
            .column(ident(COL_TABLE_NAME))
            .column(ident(COL_CURSOR_COLUMN))
            .column(ident(COL_LAST_VALUE))
            .column(ident(COL_LAST_UPDATED))
            .order_by_asc(COL_SCHEMA_NAME)
            .order_by_asc(COL_TABLE_NAME)
            .order_by_asc(COL_CURSOR_COLUMN)
            .build();
        render(&select, self.dialect).0
    }

    /// Insert-or-advance; `GREATEST` keeps the stored value from moving backwards.
    pub fn upsert_watermark(
        &self,
        table: &TableRef,
        key: &TableKey,
        watermark: &Watermark,
    ) -> (String, Vec<Value>) {
        let insert = Insert {
            table: table.clone(),
            columns: vec![
                COL_SCHEMA_NAME.to_string(),
                COL_TABLE_NAME.to_string(),
                COL_CURSOR_COLUMN.to_string(),
                COL_LAST_VALUE.to_string(),
                COL_LAST_UPDATED.to_string(),
            ],
            values: vec![vec![
                value(Value::String(key.schema_name.clone())),
                value(Value::String(key.table_name.clone())),
                value(Value::String(key.cursor_column.clone())),
                value(Value::Timestamp(watermark.timestamp())),
                now(),
            ]],
            select: None,
            on_conflict: Some(OnConflict {
                columns: key_columns(),
                action: ConflictAction::DoUpdate {
                    assignments: vec![
                        ConflictAssignment {
                            column: COL_LAST_VALUE.to_string(),
                            value: Expr::Function {
                                name: "GREATEST".to_string(),
                                args: vec![
                                    qualified(&table.name, COL_LAST_VALUE),
                                    excluded(COL_LAST_VALUE),
                                ],
                                star: false,
                            },
                        },
                        ConflictAssignment {
                            column: COL_LAST_UPDATED.to_string(),
                            value: now(),
                        },
                    ],
                },
            }),
        };
        render(&insert, self.dialect)
    }
}

fn now() -> Expr {
    Expr::Function {
        name: "now".to_string(),
        args: Vec::new(),
        star: false,
    }
}

/// The row proposed for insertion inside `ON CONFLICT DO UPDATE`. Postgres
/// only resolves the lowercase name, quoted or not.
fn excluded(column: &str) -> Expr {
    qualified("excluded", column)
}

fn key_columns() -> Vec<String> {
    vec![
        COL_SCHEMA_NAME.to_string(),
        COL_TABLE_NAME.to_string(),
        COL_CURSOR_COLUMN.to_string(),
    ]
}

fn key_match(column: &str, val: &str) -> Expr {
    Expr::binary(
        ident(column),
        BinaryOperator::Eq,
        value(Value::String(val.to_string())),
    )
}
