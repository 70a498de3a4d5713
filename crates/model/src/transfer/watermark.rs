use crate::{core::value::Value, transfer::key::TableKey};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The highest cursor value a replication stream has durably processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Watermark(DateTime<Utc>);

#[derive(Debug, Error, PartialEq)]
#[error("unsupported cursor type '{type_name}' in column '{column}' (expected date or timestamp)")]
pub struct CursorTypeError {
    pub column: String,
    pub type_name: &'static str,
}

impl Watermark {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Watermark(ts)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Normalizes a cursor column value. Naive timestamps and dates are
    /// taken as UTC; NULL yields `None`.
    pub fn from_value(column: &str, value: &Value) -> Result<Option<Self>, CursorTypeError> {
        match value {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(Watermark(*ts))),
            Value::TimestampNaive(ts) => Ok(Some(Watermark(ts.and_utc()))),
            Value::Date(d) => Ok(Some(Watermark(d.and_time(NaiveTime::MIN).and_utc()))),
            other => Err(CursorTypeError {
                column: column.to_string(),
                type_name: other.type_name(),
            }),
        }
    }

    /// Larger of two optional watermarks.
    pub fn max_of(a: Option<Watermark>, b: Option<Watermark>) -> Option<Watermark> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(ts: DateTime<Utc>) -> Self {
        Watermark(ts)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A persisted checkpoint for one `TableKey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub key: TableKey,
    pub last_value: Watermark,
    pub last_updated: DateTime<Utc>,
}
