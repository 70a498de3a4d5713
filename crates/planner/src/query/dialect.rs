//! Defines the `Dialect` trait for database-specific SQL syntax.

use crate::query::ast::expr::Expr;
use model::{core::value::Value, transfer::watermark::Watermark};

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect, doubling any embedded quote.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn get_placeholder(&self, index: usize) -> String;

    /// Renders the row window clause that follows ORDER BY.
    fn render_window(&self, offset: Option<u64>, limit: Option<u64>) -> String;

    /// Expression comparing against a watermark, bound as a parameter.
    fn watermark_expr(&self, watermark: &Watermark) -> Expr;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn get_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn render_window(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        let mut clause = String::new();
        if let Some(offset) = offset {
            clause.push_str(&format!(" OFFSET {offset} ROWS"));
        }
        if let Some(limit) = limit {
            clause.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        clause
    }

    fn watermark_expr(&self, watermark: &Watermark) -> Expr {
        // The explicit cast lets one parameter type serve both
        // `timestamp` and `timestamptz` cursor columns.
        Expr::Cast {
            expr: Box::new(Expr::Value(Value::Timestamp(watermark.timestamp()))),
            data_type: "TIMESTAMPTZ".to_string(),
        }
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn render_window(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (offset, limit) {
            (offset, Some(limit)) => format!(" LIMIT {limit} OFFSET {}", offset.unwrap_or(0)),
            // MySQL has no OFFSET without LIMIT; this is its documented idiom.
            (Some(offset), None) => format!(" LIMIT 18446744073709551615 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn watermark_expr(&self, watermark: &Watermark) -> Expr {
        // Sessions run with time_zone = '+00:00', so the naive UTC value compares correctly.
        Expr::Value(Value::TimestampNaive(watermark.timestamp().naive_utc()))
    }

    fn name(&self) -> String {
        "MySQL".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_escapes_identifiers() {
        assert_eq!(Postgres.quote_identifier("UpdatedAt"), r#""UpdatedAt""#);
        assert_eq!(Postgres.quote_identifier(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(MySql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn renders_windows_per_dialect() {
        assert_eq!(
            Postgres.render_window(Some(10000), Some(2000)),
            " OFFSET 10000 ROWS FETCH NEXT 2000 ROWS ONLY"
        );
        assert_eq!(
            MySql.render_window(Some(10000), Some(2000)),
            " LIMIT 2000 OFFSET 10000"
        );
        assert_eq!(Postgres.render_window(None, None), "");
    }
}
