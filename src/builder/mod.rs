//! Dataset transformation builder
//!
//! [`DatasetBuilder`] collects transformation requests and applies them to
//! a source dataset in a fixed pipeline order, whatever order they were
//! requested in:
//!
//! 1. value substitution (including null sentinels),
//! 2. column exclusion,
//! 3. trailing-space trimming of string cells,
//! 4. row sorting.
//!
//! Stages with nothing to do are skipped, so a builder with no requests
//! hands back the source dataset itself.

mod exclusion;

use std::borrow::Cow;

use crate::error::Result;
use crate::model::{CellValue, Dataset, Table};

pub use exclusion::{ColumnPattern, ExcludeColumns};

/// Fluent builder producing a transformed view of a dataset
#[derive(Debug, Clone)]
pub struct DatasetBuilder<'a> {
    dataset: &'a Dataset,
    replacements: Vec<(CellValue, CellValue)>,
    exclusions: ExcludeColumns,
    rtrim: bool,
    sorted: bool,
}

/// Start building from a dataset
pub fn dataset(dataset: &Dataset) -> DatasetBuilder<'_> {
    DatasetBuilder::new(dataset)
}

impl<'a> DatasetBuilder<'a> {
    /// Create a new builder over a source dataset
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            replacements: Vec::new(),
            exclusions: ExcludeColumns::new(),
            rtrim: false,
            sorted: false,
        }
    }

    /// Replace cells equal to `value` with null
    pub fn null_value(self, value: impl Into<CellValue>) -> Self {
        self.replacement(value, CellValue::Null)
    }

    /// Replace cells equal to `original` with `replacement`.
    /// Registering the same original again overrides the earlier mapping.
    pub fn replacement(
        mut self,
        original: impl Into<CellValue>,
        replacement: impl Into<CellValue>,
    ) -> Self {
        let original = original.into();
        let replacement = replacement.into();
        match self.replacements.iter_mut().find(|(o, _)| *o == original) {
            Some(entry) => entry.1 = replacement,
            None => self.replacements.push((original, replacement)),
        }
        self
    }

    /// Exclude columns, given as `"column"` for every table or
    /// `"table.column"` for one table
    pub fn exclude_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.exclusions.add(name.as_ref());
        }
        self
    }

    /// Strip trailing spaces from string cells
    pub fn rtrim(mut self, trim: bool) -> Self {
        self.rtrim = trim;
        self
    }

    /// Sort the rows of every table by all of its columns
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Apply the requested transformations.
    ///
    /// The source is never modified. With nothing requested, the source
    /// itself is returned borrowed.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::RowArity`](crate::FixtureError::RowArity) when
    /// a table has rows that do not fit its schema.
    pub fn build(&self) -> Result<Cow<'a, Dataset>> {
        let mut result = Cow::Borrowed(self.dataset);

        if !self.replacements.is_empty() {
            result = Cow::Owned(result.map_tables(|t| Ok(self.replace_table(t)))?);
        }

        if !self.exclusions.is_empty() {
            result = Cow::Owned(result.map_tables(|t| self.exclusions.apply(t))?);
        }

        if self.rtrim {
            result = Cow::Owned(result.map_tables(|t| Ok(rtrim_table(t)))?);
        }

        if self.sorted {
            result = Cow::Owned(result.map_tables(|t| {
                let mut table = t.clone();
                table.sort_rows();
                Ok(table)
            })?);
        }

        tracing::trace!(
            replacements = self.replacements.len(),
            exclusions = !self.exclusions.is_empty(),
            rtrim = self.rtrim,
            sorted = self.sorted,
            copied = matches!(result, Cow::Owned(_)),
            "built dataset"
        );

        Ok(result)
    }

    fn replace_table(&self, table: &Table) -> Table {
        map_cells(table, |cell| {
            self.replacements
                .iter()
                .find(|(original, _)| original == cell)
                .map(|(_, replacement)| replacement.clone())
        })
    }
}

fn rtrim_table(table: &Table) -> Table {
    map_cells(table, |cell| match cell.rtrim() {
        Cow::Owned(trimmed) => Some(trimmed),
        Cow::Borrowed(_) => None,
    })
}

/// Copy a table, swapping cells for which `f` yields a new value
fn map_cells<F>(table: &Table, f: F) -> Table
where
    F: Fn(&CellValue) -> Option<CellValue>,
{
    let mut result = Table::new(table.name.clone(), table.columns.clone());
    for row in &table.rows {
        let cells = row
            .cells
            .iter()
            .map(|cell| f(cell).unwrap_or_else(|| cell.clone()))
            .collect();
        result.add_row(cells, row.source_line);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;
    use chrono::NaiveDate;

    fn date(s: &str) -> CellValue {
        CellValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn emp(rows: Vec<Vec<CellValue>>) -> Table {
        let mut table = Table::with_column_names("emp", &["empno", "ename", "hiredate", "sal"]);
        for row in rows {
            table.push(row);
        }
        table
    }

    fn single(table: Table) -> Dataset {
        Dataset::from_tables([table]).unwrap()
    }

    #[test]
    fn test_no_configuration_returns_source() {
        let source = single(emp(vec![vec![
            7369.into(),
            "SMITH".into(),
            date("1980-12-17"),
            800.0.into(),
        ]]));

        let actual = DatasetBuilder::new(&source).build().unwrap();
        assert!(matches!(actual, Cow::Borrowed(_)));
        assert!(std::ptr::eq(actual.as_ref(), &source));
    }

    #[test]
    fn test_null_value() {
        let source = single(emp(vec![
            vec![7369.into(), "[null]".into(), date("1980-12-17"), 800.0.into()],
            vec![7499.into(), "ALLEN".into(), "[null]".into(), 1600.0.into()],
            vec![7521.into(), "WARD".into(), date("1981-02-22"), "[null]".into()],
        ]));
        let expected = single(emp(vec![
            vec![7369.into(), CellValue::Null, date("1980-12-17"), 800.0.into()],
            vec![7499.into(), "ALLEN".into(), CellValue::Null, 1600.0.into()],
            vec![7521.into(), "WARD".into(), date("1981-02-22"), CellValue::Null],
        ]));

        let actual = dataset(&source).null_value("[null]").build().unwrap();
        assert_eq!(actual.as_ref(), &expected);
    }

    #[test]
    fn test_null_value_without_matches_copies_unchanged() {
        let source = single(emp(vec![vec![
            7369.into(),
            "SMITH".into(),
            date("1980-12-17"),
            800.0.into(),
        ]]));

        let actual = dataset(&source).null_value("[null]").build().unwrap();
        assert_eq!(actual.as_ref(), &source);
    }

    #[test]
    fn test_replacement_override() {
        let source = single(emp(vec![vec![
            7369.into(),
            "SMITH".into(),
            CellValue::Null,
            CellValue::Null,
        ]]));

        let actual = dataset(&source)
            .replacement("SMITH", "JONES")
            .replacement("SMITH", "BLAKE")
            .build()
            .unwrap();
        assert_eq!(
            actual.table("emp").unwrap().value(0, "ename"),
            Some(&CellValue::from("BLAKE"))
        );
    }

    #[test]
    fn test_rtrim() {
        let mut table = Table::with_column_names("emp", &["empno", "ename"]);
        for (no, name) in [(1, "aaa"), (2, "bbb   "), (3, "   ccc"), (4, "  ddd   "), (5, "  e e e   ")] {
            table.push([CellValue::Int(no), name.into()]);
        }
        let source = single(table);

        let untouched = dataset(&source).rtrim(false).build().unwrap();
        assert!(matches!(untouched, Cow::Borrowed(_)));

        let trimmed = dataset(&source).rtrim(true).build().unwrap();
        let names: Vec<_> = trimmed
            .table("emp")
            .unwrap()
            .rows
            .iter()
            .map(|r| r.cells[1].to_string())
            .collect();
        assert_eq!(names, ["aaa", "bbb", "   ccc", "  ddd", "  e e e"]);
    }

    #[test]
    fn test_rtrim_leaves_non_strings() {
        let source = single(emp(vec![vec![
            7369.into(),
            "SMITH ".into(),
            date("1980-12-17"),
            800.5.into(),
        ]]));

        let trimmed = dataset(&source).rtrim(true).build().unwrap();
        let row = &trimmed.table("emp").unwrap().rows[0];
        assert_eq!(row.cells[0], CellValue::Int(7369));
        assert_eq!(row.cells[2], date("1980-12-17"));
        assert_eq!(row.cells[3], CellValue::Float(800.5));
    }

    #[test]
    fn test_pipeline_order_is_fixed() {
        let source = single(emp(vec![
            vec![7369.into(), "x  ".into(), "x".into(), 800.0.into()],
            vec![7499.into(), "x".into(), date("1981-02-20"), "x".into()],
        ]));

        let a = dataset(&source)
            .null_value("x")
            .exclude_columns(["empno"])
            .rtrim(true)
            .build()
            .unwrap();
        let b = dataset(&source)
            .rtrim(true)
            .exclude_columns(["empno"])
            .null_value("x")
            .build()
            .unwrap();
        assert_eq!(a, b);

        // Substitution runs before trimming, so "x  " survives as "x"
        let emp = a.table("emp").unwrap();
        assert_eq!(emp.value(0, "ename"), Some(&CellValue::from("x")));
        assert_eq!(emp.value(1, "ename"), Some(&CellValue::Null));
        assert_eq!(emp.column_count(), 3);
    }

    #[test]
    fn test_exclude_columns_scoped_to_table() {
        let mut dept = Table::with_column_names("dept", &["deptno", "dname"]);
        dept.push([CellValue::Int(10), "ACCOUNTING".into()]);
        let mut emp = Table::with_column_names("emp", &["empno", "deptno"]);
        emp.push([7369, 20]);
        let source = Dataset::from_tables([dept, emp]).unwrap();

        let actual = dataset(&source).exclude_columns(["dept.deptno"]).build().unwrap();
        assert_eq!(
            actual.table("dept").unwrap().column_names().collect::<Vec<_>>(),
            ["dname"]
        );
        assert_eq!(
            actual.table("emp").unwrap().column_names().collect::<Vec<_>>(),
            ["empno", "deptno"]
        );
    }

    #[test]
    fn test_null_value_across_tables() {
        let mut dept = Table::with_column_names("dept", &["deptno", "dname", "loc"]);
        dept.push([CellValue::Int(10), "ACCOUNTING".into(), "[null]".into()]);
        let source = Dataset::from_tables([
            dept,
            emp(vec![vec![7369.into(), "[null]".into(), date("1980-12-17"), 800.0.into()]]),
        ])
        .unwrap();

        let actual = dataset(&source).null_value("[null]").build().unwrap();
        assert_eq!(actual.table_names(), ["dept", "emp"]);

        let dept = actual.table("dept").unwrap();
        assert_eq!(dept.value(0, "dname"), Some(&CellValue::from("ACCOUNTING")));
        assert_eq!(dept.value(0, "loc"), Some(&CellValue::Null));

        let emp = actual.table("emp").unwrap();
        assert_eq!(emp.value(0, "ename"), Some(&CellValue::Null));
        assert_eq!(emp.value(0, "sal"), Some(&CellValue::Float(800.0)));
    }

    #[test]
    fn test_exclusion_drops_one_column() {
        let source = single(emp(vec![vec![
            7369.into(),
            "SMITH".into(),
            date("1980-12-17"),
            800.0.into(),
        ]]));
        let before = source.table("emp").unwrap().column_count();

        let excluded = dataset(&source).exclude_columns(["hiredate"]).build().unwrap();
        let emp = excluded.table("emp").unwrap();
        assert_eq!(emp.column_count(), before - 1);
        assert!(emp.column("hiredate").is_none());
        assert_eq!(emp.rows[0].cells.len(), before - 1);
        assert_eq!(emp.value(0, "sal"), Some(&CellValue::Float(800.0)));

        let absent = dataset(&source).exclude_columns(["comm"]).build().unwrap();
        assert_eq!(absent.table("emp").unwrap().column_count(), before);
        assert_eq!(absent.as_ref(), &source);
    }

    #[test]
    fn test_sorted() {
        let mut table = Table::with_column_names("emp", &["empno"]);
        table.push([7566]).push([7369]);
        let source = single(table);

        let actual = dataset(&source).sorted(true).build().unwrap();
        assert_eq!(
            actual.table("emp").unwrap().value(0, "empno"),
            Some(&CellValue::Int(7369))
        );
        assert_eq!(source.table("emp").unwrap().value(0, "empno"), Some(&CellValue::Int(7566)));
    }

    #[test]
    fn test_exclusion_reports_misaligned_rows() {
        let mut table = Table::with_column_names("emp", &["empno"]);
        table.rows.push(crate::model::Row::new(vec![1.into(), 2.into()], 2));
        let source = single(table);

        assert!(dataset(&source).exclude_columns(["empno"]).build().is_err());
    }
}
