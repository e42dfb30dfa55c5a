//! Dataset equality assertions
//!
//! Datasets are compared table by table, row by row and cell by cell, in
//! row order. Callers wanting order-insensitive comparison sort both sides
//! first (see [`DatasetBuilder::sorted`](crate::builder::DatasetBuilder::sorted)).

pub mod cell;

use serde::Serialize;
use thiserror::Error;

use crate::model::{CellValue, Dataset, Table};

pub use cell::CellComparator;

/// A difference between an expected and an actual dataset
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetMismatch {
    /// The datasets hold different tables
    #[error("table names differ: expected {expected:?} but was {actual:?}")]
    TableNames {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A table has different columns
    #[error("column names differ (table={table}): expected {expected:?} but was {actual:?}")]
    Columns {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A table has a different number of rows
    #[error("row count differs (table={table}): expected {expected} but was {actual}")]
    RowCount {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A cell holds a different value
    #[error(
        "value differs (table={table}, row={row}, column={column}): expected <{expected}> but was <{actual}>"
    )]
    Value {
        table: String,
        /// 0-based row position
        row: usize,
        column: String,
        expected: CellValue,
        actual: CellValue,
    },
}

/// Outcome of comparing two datasets
#[derive(Debug, Default, Clone, Serialize)]
pub struct ComparisonReport {
    pub mismatches: Vec<DatasetMismatch>,
    pub tables_compared: usize,
    pub rows_compared: usize,
    pub cells_compared: usize,
}

impl ComparisonReport {
    /// Check if the datasets matched
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// The first mismatch as an error
    pub fn into_result(self) -> Result<(), DatasetMismatch> {
        match self.mismatches.into_iter().next() {
            Some(mismatch) => Err(mismatch),
            None => Ok(()),
        }
    }
}

/// Compare two datasets, collecting every difference.
///
/// Table and column names match case-insensitively. When the table or column
/// sets differ the affected tables are not compared further.
pub fn compare_datasets(expected: &Dataset, actual: &Dataset) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    let expected_names = sorted_names(expected.table_names().iter().map(String::as_str));
    let actual_names = sorted_names(actual.table_names().iter().map(String::as_str));
    if expected_names != actual_names {
        report.mismatches.push(DatasetMismatch::TableNames {
            expected: expected_names,
            actual: actual_names,
        });
        return report;
    }

    let comparator = CellComparator::new();
    for expected_table in expected.tables() {
        if let Some(actual_table) = actual.table(&expected_table.name) {
            compare_tables(expected_table, actual_table, &comparator, &mut report);
        }
    }

    report
}

/// Assert two datasets are equal, failing on the first difference
pub fn assert_dataset_eq(expected: &Dataset, actual: &Dataset) -> Result<(), DatasetMismatch> {
    compare_datasets(expected, actual).into_result()
}

fn sorted_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = names.map(str::to_ascii_lowercase).collect();
    names.sort();
    names
}

fn compare_tables(
    expected: &Table,
    actual: &Table,
    comparator: &CellComparator,
    report: &mut ComparisonReport,
) {
    report.tables_compared += 1;

    let expected_columns = sorted_names(expected.column_names());
    let actual_columns = sorted_names(actual.column_names());
    if expected_columns != actual_columns {
        report.mismatches.push(DatasetMismatch::Columns {
            table: expected.name.clone(),
            expected: expected_columns,
            actual: actual_columns,
        });
        return;
    }

    if expected.row_count() != actual.row_count() {
        report.mismatches.push(DatasetMismatch::RowCount {
            table: expected.name.clone(),
            expected: expected.row_count(),
            actual: actual.row_count(),
        });
        return;
    }

    // Actual position of each expected column
    let positions: Vec<Option<usize>> = expected
        .columns
        .iter()
        .map(|c| actual.column_index(&c.name))
        .collect();

    for (row_idx, (expected_row, actual_row)) in expected.rows.iter().zip(&actual.rows).enumerate() {
        report.rows_compared += 1;
        for (col_idx, column) in expected.columns.iter().enumerate() {
            report.cells_compared += 1;
            let expected_value = expected_row.get(col_idx).cloned().unwrap_or(CellValue::Null);
            let actual_value = positions[col_idx]
                .and_then(|i| actual_row.get(i))
                .cloned()
                .unwrap_or(CellValue::Null);

            if !comparator.equal(&expected_value, &actual_value) {
                report.mismatches.push(DatasetMismatch::Value {
                    table: expected.name.clone(),
                    row: row_idx,
                    column: column.name.clone(),
                    expected: expected_value,
                    actual: actual_value,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emp(rows: &[(i64, &str)]) -> Dataset {
        let mut table = Table::with_column_names("emp", &["empno", "ename"]);
        for (no, name) in rows {
            table.push([CellValue::Int(*no), CellValue::from(*name)]);
        }
        Dataset::from_tables([table]).unwrap()
    }

    #[test]
    fn test_equal_datasets() {
        let report = compare_datasets(&emp(&[(7369, "SMITH")]), &emp(&[(7369, "SMITH")]));
        assert!(report.is_match());
        assert_eq!(report.cells_compared, 2);
    }

    #[test]
    fn test_value_mismatch() {
        let err = assert_dataset_eq(&emp(&[(7369, "SMITH")]), &emp(&[(7369, "SMYTHE")])).unwrap_err();
        assert_eq!(
            err,
            DatasetMismatch::Value {
                table: "emp".into(),
                row: 0,
                column: "ename".into(),
                expected: "SMITH".into(),
                actual: "SMYTHE".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "value differs (table=emp, row=0, column=ename): expected <SMITH> but was <SMYTHE>"
        );
    }

    #[test]
    fn test_row_count_mismatch() {
        let err = assert_dataset_eq(&emp(&[(7369, "SMITH")]), &emp(&[])).unwrap_err();
        assert!(matches!(err, DatasetMismatch::RowCount { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn test_table_names_mismatch() {
        let err = assert_dataset_eq(&emp(&[]), &Dataset::new()).unwrap_err();
        assert!(matches!(err, DatasetMismatch::TableNames { .. }));
    }

    #[test]
    fn test_column_order_and_case_are_ignored() {
        let mut actual = Table::with_column_names("EMP", &["ENAME", "EMPNO"]);
        actual.push([CellValue::from("SMITH"), CellValue::Int(7369)]);
        let actual = Dataset::from_tables([actual]).unwrap();

        assert!(assert_dataset_eq(&emp(&[(7369, "SMITH")]), &actual).is_ok());
    }

    #[test]
    fn test_column_mismatch() {
        let actual = Dataset::from_tables([Table::with_column_names("emp", &["empno"])]).unwrap();
        let err = assert_dataset_eq(&emp(&[]), &actual).unwrap_err();
        assert!(matches!(err, DatasetMismatch::Columns { table, .. } if table == "emp"));
    }

    #[test]
    fn test_report_collects_every_difference() {
        let report = compare_datasets(
            &emp(&[(1, "A"), (2, "B")]),
            &emp(&[(1, "X"), (3, "B")]),
        );
        assert_eq!(report.mismatches.len(), 2);
        assert_eq!(report.rows_compared, 2);
    }
}
