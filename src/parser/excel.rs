//! Spreadsheet dataset parser (xlsx, xls, ods)
//!
//! Every sheet is a table named after the sheet; its first row holds the
//! column names.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveTime;

use crate::error::{FixtureError, Result};
use crate::model::{parse_temporal, CellValue, Dataset, Table};

use super::Parser;

/// Parser for spreadsheet workbooks
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path) -> Result<Dataset> {
        let mut workbook = open_workbook_auto(path)?;

        let mut dataset = Dataset::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let table = parse_range(&sheet_name, &range).ok_or_else(|| FixtureError::Parse {
                path: path.to_path_buf(),
                message: format!("sheet '{sheet_name}' has no header row"),
            })?;
            dataset.add_table(table)?;
        }
        Ok(dataset)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

fn parse_range(name: &str, range: &Range<Data>) -> Option<Table> {
    let mut rows = range.rows();

    // First row is header; trailing blank header cells end the schema
    let header = rows.next()?;
    let names: Vec<String> = header
        .iter()
        .map(cell_to_string)
        .take_while(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }

    let mut table = Table::with_column_names(name, &names);
    for (line_num, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().take(names.len()).map(convert_cell).collect();
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    table.infer_column_types();
    Some(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if datetime.time() == NaiveTime::MIN => CellValue::Date(datetime.date()),
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_temporal(s).unwrap_or_else(|| CellValue::from(s.as_str())),
        Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => CellValue::String(format!("#{:?}", e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("empno".into()));
        range.set_value((0, 1), Data::String("ename".into()));
        range.set_value((1, 0), Data::Float(7369.0));
        range.set_value((1, 1), Data::String("SMITH  ".into()));
        range.set_value((2, 0), Data::Float(7499.0));

        let table = parse_range("emp", &range).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["empno", "ename"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "empno"), Some(&CellValue::Int(7369)));
        assert_eq!(table.value(0, "ename"), Some(&CellValue::from("SMITH  ")));
        assert_eq!(table.value(1, "ename"), Some(&CellValue::Null));
    }

    #[test]
    fn test_sheet_without_header() {
        let range: Range<Data> = Range::new((0, 0), (0, 0));
        assert!(parse_range("empty", &range).is_none());
    }
}
