use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use core::fmt;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Column as MySqlColumn, Row as MySqlRow, Value as MySqlValue, consts::ColumnType};
use rust_decimal::Decimal as RustDecimal;
use std::{fmt::Formatter, str::FromStr};
use tokio_postgres::{Row as PgRow, types::FromSql};

/// MySQL reports `binary` as character set 63 for BLOB/BINARY/BIT columns.
const MYSQL_BINARY_CHARSET: u16 = 63;

pub enum DbRow<'a> {
    MySqlRow(&'a MySqlRow),
    PostgresRow(&'a PgRow),
}

impl DbRow<'_> {
    /// Decodes every column in driver order.
    pub fn to_row_data(&self, table: &str) -> Result<RowData, DbError> {
        let columns = self.columns();
        let mut fields = Vec::with_capacity(columns.len());
        for (idx, name) in columns.into_iter().enumerate() {
            let value = self.get_value(idx, &name)?;
            fields.push(FieldValue::new(name, Some(value)));
        }
        Ok(RowData::new(table, fields))
    }

    pub fn columns(&self) -> Vec<String> {
        match self {
            DbRow::MySqlRow(row) => row
                .columns_ref()
                .iter()
                .map(|col| col.name_str().into_owned())
                .collect(),
            DbRow::PostgresRow(row) => row
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect(),
        }
    }

    pub fn get_value(&self, idx: usize, name: &str) -> Result<Value, DbError> {
        match self {
            DbRow::PostgresRow(row) => pg_value(row, idx, name),
            DbRow::MySqlRow(row) => match (row.columns_ref().get(idx), row.as_ref(idx)) {
                (Some(column), Some(raw)) => mysql_value(column, raw),
                _ => Ok(Value::Null),
            },
        }
    }
}

fn pg_get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Result<Option<T>, DbError> {
    Ok(row.try_get::<_, Option<T>>(idx)?)
}

fn pg_value(row: &PgRow, idx: usize, name: &str) -> Result<Value, DbError> {
    let type_name = row
        .columns()
        .get(idx)
        .map(|col| col.type_().name())
        .unwrap_or("unknown");

    let value = match type_name {
        "bool" => pg_get::<bool>(row, idx)?.map(Value::Boolean),
        "int2" => pg_get::<i16>(row, idx)?.map(Value::SmallInt),
        "int4" => pg_get::<i32>(row, idx)?.map(Value::Int32),
        "int8" => pg_get::<i64>(row, idx)?.map(Value::Int),
        "oid" => pg_get::<u32>(row, idx)?.map(|v| Value::Int(v as i64)),
        "float4" => pg_get::<f32>(row, idx)?.map(|v| Value::Float(v as f64)),
        "float8" => pg_get::<f64>(row, idx)?.map(Value::Float),
        "numeric" => pg_get::<RustDecimal>(row, idx)?
            .map(|d| parse_decimal(name, &d.to_string()))
            .transpose()?,
        "text" | "varchar" | "bpchar" | "name" | "citext" => {
            pg_get::<String>(row, idx)?.map(Value::String)
        }
        "json" | "jsonb" => pg_get::<serde_json::Value>(row, idx)?.map(Value::Json),
        "uuid" => pg_get::<uuid::Uuid>(row, idx)?.map(Value::Uuid),
        "bytea" => pg_get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        "date" => pg_get::<NaiveDate>(row, idx)?.map(Value::Date),
        "time" => pg_get::<NaiveTime>(row, idx)?.map(Value::Time),
        "timestamp" => pg_get::<NaiveDateTime>(row, idx)?.map(Value::TimestampNaive),
        "timestamptz" => pg_get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamp),
        "_text" | "_varchar" => pg_get::<Vec<String>>(row, idx)?.map(Value::StringArray),
        other => {
            return Err(DbError::UnsupportedType {
                column: name.to_string(),
                type_name: other.to_string(),
            });
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

fn mysql_value(column: &MySqlColumn, raw: &MySqlValue) -> Result<Value, DbError> {
    let value = match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(v) => Value::Int(*v),
        MySqlValue::UInt(v) => match i64::try_from(*v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Decimal(BigDecimal::from(*v)),
        },
        MySqlValue::Float(v) => Value::Float(*v as f64),
        MySqlValue::Double(v) => Value::Float(*v),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32);
            let decoded = match column.column_type() {
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
                    date.map(Value::Date)
                }
                _ => date
                    .and_then(|d| {
                        d.and_hms_micro_opt(*hour as u32, *minute as u32, *second as u32, *micros)
                    })
                    .map(Value::TimestampNaive),
            };
            // Zero dates ('0000-00-00') have no calendar value.
            decoded.unwrap_or(Value::Null)
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            if !negative && *days == 0 {
                NaiveTime::from_hms_micro_opt(
                    *hours as u32,
                    *minutes as u32,
                    *seconds as u32,
                    *micros,
                )
                .map(Value::Time)
                .unwrap_or(Value::Null)
            } else {
                let sign = if *negative { "-" } else { "" };
                let total_hours = *days * 24 + *hours as u32;
                Value::String(format!(
                    "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
                ))
            }
        }
        MySqlValue::Bytes(bytes) => match column.column_type() {
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                let text = String::from_utf8(bytes.clone())?;
                parse_decimal(&column.name_str(), &text)?
            }
            ColumnType::MYSQL_TYPE_JSON => serde_json::from_slice(bytes).map(Value::Json).map_err(
                |e| DbError::Unknown(format!("invalid JSON in '{}': {e}", column.name_str())),
            )?,
            _ if column.character_set() == MYSQL_BINARY_CHARSET => Value::Bytes(bytes.clone()),
            _ => Value::String(String::from_utf8(bytes.clone())?),
        },
    };
    Ok(value)
}

fn parse_decimal(column: &str, text: &str) -> Result<Value, DbError> {
    BigDecimal::from_str(text)
        .map(Value::Decimal)
        .map_err(|e| DbError::Unknown(format!("invalid decimal '{text}' in '{column}': {e}")))
}

impl fmt::Debug for DbRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DbRow::MySqlRow(row) => write!(f, "{row:?}"),
            DbRow::PostgresRow(row) => write!(f, "{row:?}"),
        }
    }
}
