//! Colored terminal output

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::assertion::{ComparisonReport, DatasetMismatch};
use crate::model::Table;

use super::ReportFormatter;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Terminal output with colors
pub struct TerminalReport {
    /// Mismatches listed before the rest are summarized
    limit: usize,
}

impl TerminalReport {
    pub fn new() -> Self {
        Self { limit: 50 }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    fn write_header(&self, writer: &mut dyn WriteColor, expected_path: &Path) -> Result<()> {
        writeln!(writer, "{RULE}")?;
        writeln!(writer, " dbfixture: verify {}", expected_path.display())?;
        writeln!(writer, "{RULE}")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_mismatches(&self, mismatches: &[DatasetMismatch], writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(writer, "Mismatches:")?;
        for mismatch in mismatches.iter().take(self.limit) {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(writer, "  ✗ ")?;
            writer.reset()?;
            writeln!(writer, "{mismatch}")?;
        }
        if mismatches.len() > self.limit {
            writeln!(writer, "  ... and {} more", mismatches.len() - self.limit)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary(&self, report: &ComparisonReport, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(
            writer,
            "Summary: {} mismatches ({} tables, {} rows, {} cells compared)",
            report.mismatches.len(),
            report.tables_compared,
            report.rows_compared,
            report.cells_compared
        )?;
        Ok(())
    }
}

impl Default for TerminalReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for TerminalReport {
    fn render(
        &self,
        report: &ComparisonReport,
        expected_path: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        self.write_header(writer, expected_path)?;

        if report.is_match() {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
            write!(writer, "✓ ")?;
            writer.reset()?;
            writeln!(writer, "Database matches expected dataset.")?;
            self.write_summary(report, writer)?;
            return Ok(());
        }

        self.write_mismatches(&report.mismatches, writer)?;
        self.write_summary(report, writer)?;
        Ok(())
    }
}

/// Format a table as a boxed grid
pub fn render_table(table: &Table) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.column_names().map(str::to_string));
    for row in &table.rows {
        builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
    }

    let mut grid = builder.build();
    grid.with(Style::modern());
    grid.to_string()
}
