//! Fixture loaders for the supported dataset file formats

mod csv;
mod excel;
mod json;
mod xml;

use std::path::Path;

use crate::error::{FixtureError, Result};
use crate::model::Dataset;

pub use self::csv::{CsvDirectoryParser, CsvParser, TABLE_ORDERING_FILE};
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;
pub use self::xml::XmlParser;

/// Trait for parsing dataset files
pub trait Parser: Send + Sync {
    /// Parse a file and return its tables
    fn parse(&self, path: &Path) -> Result<Dataset>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory selecting a parser by file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvParser),
                Box::new(ExcelParser),
                Box::new(JsonParser),
                Box::new(XmlParser),
            ],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        self.parsers
            .iter()
            .find(|p| p.supports_extension(&ext))
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                FixtureError::UnsupportedFormat(if ext.is_empty() {
                    path.display().to_string()
                } else {
                    ext
                })
            })
    }

    /// Load a dataset; directories are read as CSV directories
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(FixtureError::FixtureNotFound(path.to_path_buf()));
        }

        let dataset = if path.is_dir() {
            CsvDirectoryParser.parse_dir(path)?
        } else {
            self.get_parser(path)?.parse(path)?
        };

        tracing::debug!(
            path = %path.display(),
            tables = dataset.table_count(),
            "loaded dataset"
        );
        Ok(dataset)
    }
}

/// Load a dataset file with the default parsers
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    ParserFactory::new().load(path.as_ref())
}
