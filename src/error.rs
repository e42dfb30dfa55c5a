//! Error types for dbfixture

use std::path::PathBuf;

use thiserror::Error;

use crate::assertion::DatasetMismatch;

/// Boxed error produced by a test body
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for fixture operations
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Fixture file does not exist
    #[error("fixture not found: {}", .0.display())]
    FixtureNotFound(PathBuf),

    /// Fixture file extension has no loader
    #[error("unsupported fixture format: {0}")]
    UnsupportedFormat(String),

    /// Configured driver is not available
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Error reading a fixture or config file
    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed fixture content
    #[error("parse error in '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Table is missing from the database
    #[error("no such table: {0}")]
    NoSuchTable(String),

    /// Operation needs a primary key the table does not declare
    #[error("table '{0}' has no primary key")]
    NoPrimaryKey(String),

    /// Update matched no row
    #[error("row {row} of table '{table}' not found in database")]
    RowNotFound { table: String, row: usize },

    /// Row width differs from the table schema
    #[error("row {row} of table '{table}' has {found} cells, expected {expected}")]
    RowArity {
        table: String,
        row: usize,
        found: usize,
        expected: usize,
    },

    /// Dataset already holds a table with this name
    #[error("duplicate table: {0}")]
    DuplicateTable(String),

    /// Expected and actual datasets differ
    #[error(transparent)]
    Mismatch(#[from] DatasetMismatch),

    /// The wrapped test body failed
    #[error(transparent)]
    Test(BoxError),
}

impl FixtureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FixtureError::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this is a dataset assertion failure
    pub fn is_mismatch(&self) -> bool {
        matches!(self, FixtureError::Mismatch(_))
    }

    /// Recover the test body's own error, if this wraps one
    pub fn into_test_error(self) -> std::result::Result<BoxError, Self> {
        match self {
            FixtureError::Test(e) => Ok(e),
            other => Err(other),
        }
    }
}

/// Result type alias for fixture operations
pub type Result<T> = std::result::Result<T, FixtureError>;
