//! CSV fixture parsers: a single file, or a directory of files

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{FixtureError, Result};
use crate::model::{CellValue, Dataset, Table};

use super::Parser;

/// Lists the tables of a CSV directory, one name per line
pub const TABLE_ORDERING_FILE: &str = "table-ordering.txt";

/// Parser for a single CSV file holding one table named after the file stem
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path) -> Result<Dataset> {
        let table = read_csv_file(path, &table_name(path)?)?;
        Dataset::from_tables([table])
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv")
    }
}

/// Parser for a directory of CSV files, one table per file
pub struct CsvDirectoryParser;

impl CsvDirectoryParser {
    /// Load every table of the directory, in `table-ordering.txt` order when
    /// present and file name order otherwise
    pub fn parse_dir(&self, dir: &Path) -> Result<Dataset> {
        let ordering = dir.join(TABLE_ORDERING_FILE);
        let files: Vec<(String, PathBuf)> = if ordering.is_file() {
            fs::read_to_string(&ordering)
                .map_err(|e| FixtureError::io(&ordering, e))?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(|name| (name.to_string(), dir.join(format!("{name}.csv"))))
                .collect()
        } else {
            let mut files = Vec::new();
            for entry in fs::read_dir(dir).map_err(|e| FixtureError::io(dir, e))? {
                let path = entry.map_err(|e| FixtureError::io(dir, e))?.path();
                let is_csv = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
                if is_csv {
                    files.push((table_name(&path)?, path));
                }
            }
            files.sort();
            files
        };

        let mut dataset = Dataset::new();
        for (name, path) in files {
            if !path.is_file() {
                return Err(FixtureError::FixtureNotFound(path));
            }
            dataset.add_table(read_csv_file(&path, &name)?)?;
        }
        Ok(dataset)
    }
}

fn table_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| FixtureError::Parse {
            path: path.to_path_buf(),
            message: "cannot derive a table name from the file name".to_string(),
        })
}

fn read_csv_file(path: &Path, name: &str) -> Result<Table> {
    let file = File::open(path).map_err(|e| FixtureError::io(path, e))?;
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    let delimiter = if is_tsv { b'\t' } else { b',' };
    read_csv_table(name, BufReader::new(file), delimiter)
}

/// Read one table from CSV text; the header row names the columns
pub(crate) fn read_csv_table<R: Read>(name: &str, reader: R, delimiter: u8) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let names: Vec<&str> = headers.iter().map(str::trim).collect();
    let mut table = Table::with_column_names(name, &names);

    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result?;
        let cells: Vec<CellValue> = record.iter().map(CellValue::text).collect();
        let line = line_num + 2; // +2 for 1-indexing and header

        if cells.len() > table.column_count() {
            return Err(FixtureError::RowArity {
                table: name.to_string(),
                row: line,
                found: cells.len(),
                expected: table.column_count(),
            });
        }
        table.add_row(cells, line);
    }

    table.infer_column_types();
    Ok(table)
}
