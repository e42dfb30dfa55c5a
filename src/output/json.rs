//! JSON output format

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::assertion::{ComparisonReport, DatasetMismatch};

use super::ReportFormatter;

/// JSON output formatter
pub struct JsonReport {
    pretty: bool,
}

impl JsonReport {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReportOutput<'a> {
    expected_file: String,
    matched: bool,
    mismatches: &'a [DatasetMismatch],
    stats: JsonStats,
}

#[derive(Serialize)]
struct JsonStats {
    tables_compared: usize,
    rows_compared: usize,
    cells_compared: usize,
}

impl ReportFormatter for JsonReport {
    fn render(
        &self,
        report: &ComparisonReport,
        expected_path: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let output = JsonReportOutput {
            expected_file: expected_path.display().to_string(),
            matched: report.is_match(),
            mismatches: &report.mismatches,
            stats: JsonStats {
                tables_compared: report.tables_compared,
                rows_compared: report.rows_compared,
                cells_compared: report.cells_compared,
            },
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
