//! Conversion between cell values and SQLite values

use rusqlite::types::{Value, ValueRef};

use crate::model::{parse_temporal, CellType, CellValue};

/// Convert a cell to a bindable SQLite value.
/// Dates and datetimes are stored as ISO-8601 text, booleans as 0/1.
pub fn to_sql(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
        CellValue::Int(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::String(s) => Value::Text(s.to_string()),
        CellValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        CellValue::DateTime(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        CellValue::Bytes(b) => Value::Blob(b.clone()),
    }
}

/// Read fixture text as a value for a column of `cell_type`, following
/// SQLite's affinity rules: text with no lossless reading in that type
/// stays text, so `007` in a `VARCHAR` column is still `"007"`.
pub fn from_text(text: &str, cell_type: CellType) -> CellValue {
    let trimmed = text.trim();
    let typed = match cell_type {
        CellType::Int | CellType::Mixed => parse_integer(trimmed).or_else(|| parse_real(trimmed)),
        CellType::Float => parse_real(trimmed),
        CellType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(CellValue::Bool(true)),
            "false" | "0" => Some(CellValue::Bool(false)),
            _ => None,
        },
        CellType::Date | CellType::DateTime => parse_temporal(trimmed),
        CellType::String | CellType::Bytes | CellType::Null => None,
    };
    typed.unwrap_or_else(|| CellValue::from(text))
}

fn parse_integer(s: &str) -> Option<CellValue> {
    s.parse().ok().map(CellValue::Int)
}

// Rust also parses "inf" and "NaN"; only digits make a number here
fn parse_real(s: &str) -> Option<CellValue> {
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().map(CellValue::Float)
}

/// Convert a stored value, guided by the column's declared type
pub fn from_sql(value: ValueRef<'_>, cell_type: CellType) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) if cell_type == CellType::Bool => CellValue::Bool(i != 0),
        ValueRef::Integer(i) => CellValue::Int(i),
        ValueRef::Real(f) => CellValue::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match cell_type {
                CellType::Date | CellType::DateTime => {
                    parse_temporal(&text).unwrap_or_else(|| CellValue::from(text.into_owned()))
                }
                _ => CellValue::from(text.into_owned()),
            }
        }
        ValueRef::Blob(bytes) => CellValue::Bytes(bytes.to_vec()),
    }
}
