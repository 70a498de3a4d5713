use crate::sql::base::encoder::CopyValueEncoder;
use chrono::SecondsFormat;
use model::core::{
    utils::{encode_bytea, escape_csv_string},
    value::Value,
};

/// Encodes values for `COPY ... WITH (FORMAT CSV, NULL '\N')`.
///
/// Text is always quoted, so a literal `\N` string never collides with the
/// unquoted NULL marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgCopyValueEncoder;

impl PgCopyValueEncoder {
    pub fn new() -> Self {
        Self
    }

    fn encode_array_literal(&self, values: &[String]) -> String {
        let mut literal = String::from('{');
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                literal.push(',');
            }
            literal.push_str(&Self::quote_array_item(value));
        }
        literal.push('}');
        literal
    }

    fn quote_array_item(value: &str) -> String {
        let mut quoted = String::from('"');
        for ch in value.chars() {
            match ch {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                _ => quoted.push(ch),
            }
        }
        quoted.push('"');
        quoted
    }

    /// One CSV line, terminated by `\n`.
    pub fn encode_line<'a>(&self, values: impl IntoIterator<Item = Option<&'a Value>>) -> String {
        let mut line = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&self.encode_optional(value));
        }
        line.push('\n');
        line
    }
}

impl CopyValueEncoder for PgCopyValueEncoder {
    fn encode_value(&self, value: &Value) -> String {
        match value {
            Value::Null => self.encode_null(),
            Value::String(s) => escape_csv_string(s),
            Value::Json(v) => escape_csv_string(&v.to_string()),
            Value::StringArray(values) => {
                let literal = self.encode_array_literal(values);
                escape_csv_string(&literal)
            }
            Value::Bytes(bytes) => {
                let hex = encode_bytea(bytes);
                escape_csv_string(&hex)
            }
            Value::Boolean(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => ryu::Buffer::new().format(*v).to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::Uuid(v) => v.to_string(),
            Value::Date(d) => d.to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.6f").to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Micros, true),
            Value::TimestampNaive(ts) => ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }

    fn encode_null(&self) -> String {
        "\\N".to_string()
    }
}
