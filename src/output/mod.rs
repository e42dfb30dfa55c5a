//! Rendering of comparison reports and live tables

mod json;
mod terminal;

use std::path::Path;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::assertion::ComparisonReport;

pub use json::JsonReport;
pub use terminal::{render_table, TerminalReport};

/// Report formats understood by [`ReportFactory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Trait for report formatters
pub trait ReportFormatter {
    /// Render a comparison of the live database against `expected_path`
    fn render(
        &self,
        report: &ComparisonReport,
        expected_path: &Path,
        writer: &mut dyn WriteColor,
    ) -> Result<()>;
}

/// Factory for creating report formatters
pub struct ReportFactory;

impl ReportFactory {
    /// Create a report formatter based on format type
    pub fn create(format: ReportFormat) -> Box<dyn ReportFormatter> {
        match format {
            ReportFormat::Terminal => Box::new(TerminalReport::new()),
            ReportFormat::Json => Box::new(JsonReport::new()),
        }
    }
}

/// Render a comparison report to stdout
pub fn render_to_stdout(
    report: &ComparisonReport,
    expected_path: &Path,
    format: ReportFormat,
) -> Result<()> {
    let formatter = ReportFactory::create(format);
    let choice = match format {
        ReportFormat::Terminal => ColorChoice::Auto,
        ReportFormat::Json => ColorChoice::Never,
    };
    let mut stdout = StandardStream::stdout(choice);
    formatter.render(report, expected_path, &mut stdout)
}
