//! JSON dataset parser
//!
//! The file is an object mapping table names to arrays of row objects:
//!
//! ```json
//! { "emp": [ { "empno": 7369, "ename": "SMITH" } ] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::error::{FixtureError, Result};
use crate::model::{CellValue, Dataset, Table};

use super::Parser;

/// Parser for JSON dataset files
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path).map_err(|e| FixtureError::io(path, e))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        parse_value(value).map_err(|message| FixtureError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("json")
    }
}

fn parse_value(value: Value) -> std::result::Result<Dataset, String> {
    let Value::Object(tables) = value else {
        return Err("dataset must be an object of tables".to_string());
    };

    let mut dataset = Dataset::new();
    for (name, rows) in tables {
        let Value::Array(rows) = rows else {
            return Err(format!("table '{name}' must be an array of rows"));
        };
        let table = parse_table(&name, &rows)?;
        dataset.add_table(table).map_err(|e| e.to_string())?;
    }
    Ok(dataset)
}

fn parse_table(name: &str, rows: &[Value]) -> std::result::Result<Table, String> {
    let objects: Vec<&Map<String, Value>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_object()
                .ok_or_else(|| format!("row {} of table '{name}' is not an object", i + 1))
        })
        .collect::<std::result::Result<_, _>>()?;

    // Columns in first-seen key order across all rows
    let mut column_names: IndexSet<&str> = IndexSet::new();
    for obj in &objects {
        column_names.extend(obj.keys().map(String::as_str));
    }
    let names: Vec<&str> = column_names.into_iter().collect();
    let mut table = Table::with_column_names(name, &names);

    for (i, obj) in objects.iter().enumerate() {
        let cells = names
            .iter()
            .map(|col| match obj.get(*col) {
                Some(v) => convert_value(v).ok_or_else(|| {
                    format!("column '{col}' of row {} in table '{name}' is not a scalar", i + 1)
                }),
                None => Ok(CellValue::Null),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        table.add_row(cells, i + 1);
    }

    table.infer_column_types();
    Ok(table)
}

fn convert_value(value: &Value) -> Option<CellValue> {
    match value {
        Value::Null => Some(CellValue::Null),
        Value::Bool(b) => Some(CellValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(CellValue::Int)
            .or_else(|| n.as_f64().map(CellValue::Float)),
        // Typed later from the target column, like CSV text
        Value::String(s) => Some(CellValue::from(s.as_str())),
        Value::Array(_) | Value::Object(_) => None,
    }
}
