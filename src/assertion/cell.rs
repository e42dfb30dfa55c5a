//! Cell-level comparison logic

use chrono::NaiveTime;

use crate::model::{parse_temporal, CellType, CellValue};

/// Compares an expected cell with the value read back from the database.
///
/// Fixture files and SQLite do not always agree on representation (a date
/// column may come back as text, a boolean as an integer), so when the
/// values differ the expected one is converted to the actual value's type
/// before giving up.
#[derive(Debug, Default, Clone, Copy)]
pub struct CellComparator;

impl CellComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare two cell values for equality
    pub fn equal(&self, expected: &CellValue, actual: &CellValue) -> bool {
        if expected == actual {
            return true;
        }
        coerce(expected, actual.cell_type()).is_some_and(|e| e == *actual)
    }
}

/// Convert a value to another cell type, if it has a lossless reading there
pub fn coerce(value: &CellValue, target: CellType) -> Option<CellValue> {
    match (value, target) {
        (CellValue::String(s), CellType::Int | CellType::Float) => {
            let s = s.trim();
            s.parse()
                .map(CellValue::Int)
                .or_else(|_| s.parse().map(CellValue::Float))
                .ok()
        }
        (CellValue::String(s), CellType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(CellValue::Bool(true)),
            "false" | "0" => Some(CellValue::Bool(false)),
            _ => None,
        },
        (CellValue::String(s), CellType::Date | CellType::DateTime) => {
            parse_temporal(s.trim()).and_then(|v| coerce_temporal(&v, target))
        }
        (CellValue::Date(_) | CellValue::DateTime(_), CellType::Date | CellType::DateTime) => {
            coerce_temporal(value, target)
        }
        (CellValue::Bool(b), CellType::Int) => Some(CellValue::Int(i64::from(*b))),
        (CellValue::Int(i @ (0 | 1)), CellType::Bool) => Some(CellValue::Bool(*i == 1)),
        (
            CellValue::Date(_)
            | CellValue::DateTime(_)
            | CellValue::Int(_)
            | CellValue::Float(_)
            | CellValue::Bool(_),
            CellType::String,
        ) => Some(CellValue::from(value.display().into_owned())),
        _ => None,
    }
}

fn coerce_temporal(value: &CellValue, target: CellType) -> Option<CellValue> {
    match (value, target) {
        (CellValue::Date(d), CellType::Date) => Some(CellValue::Date(*d)),
        (CellValue::Date(d), CellType::DateTime) => {
            Some(CellValue::DateTime(d.and_time(NaiveTime::MIN)))
        }
        (CellValue::DateTime(dt), CellType::DateTime) => Some(CellValue::DateTime(*dt)),
        (CellValue::DateTime(dt), CellType::Date) if dt.time() == NaiveTime::MIN => {
            Some(CellValue::Date(dt.date()))
        }
        _ => None,
    }
}
