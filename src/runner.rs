//! Fixture-aware test orchestration
//!
//! [`FixtureRunner::run`] wraps a test body:
//!
//! 1. open a setup connection,
//! 2. load the init dataset (null sentinel applied) and run the setup
//!    operation,
//! 3. run the body, committing its test connection on success and rolling
//!    it back on any failure,
//! 4. close every connection,
//! 5. compare the expected dataset, if declared, with the live tables.
//!
//! The first failure is the one returned; failures while cleaning up after
//! it are logged and dropped.

use std::cell::OnceCell;
use std::path::Path;

use rusqlite::Connection;

use crate::assertion::{compare_datasets, ComparisonReport};
use crate::builder::DatasetBuilder;
use crate::config::{FixtureConfig, FixtureSpec, SortOrder};
use crate::database::{conform_dataset, read_dataset, DataSource, DatabaseOperation};
use crate::error::{BoxError, FixtureError, Result};
use crate::model::Dataset;
use crate::parser::ParserFactory;

/// Handed to the test body in place of injected fields
pub struct FixtureContext<'a> {
    data_source: &'a DataSource,
    connection: OnceCell<Connection>,
}

impl<'a> FixtureContext<'a> {
    fn new(data_source: &'a DataSource) -> Self {
        Self {
            data_source,
            connection: OnceCell::new(),
        }
    }

    /// The data source the fixture was applied through
    pub fn data_source(&self) -> &'a DataSource {
        self.data_source
    }

    /// The test connection.
    ///
    /// Opened on first use with a transaction already begun; the runner
    /// commits it when the body succeeds and rolls it back otherwise.
    pub fn connection(&self) -> Result<&Connection> {
        if let Some(conn) = self.connection.get() {
            return Ok(conn);
        }
        let conn = self.data_source.connection()?;
        conn.execute_batch("BEGIN")?;
        tracing::debug!(url = self.data_source.url(), "opened test connection");
        Ok(self.connection.get_or_init(|| conn))
    }

    /// Whether the body asked for a test connection
    pub fn has_connection(&self) -> bool {
        self.connection.get().is_some()
    }

    fn commit(&self) -> Result<()> {
        match self.connection.get() {
            Some(conn) if !conn.is_autocommit() => Ok(conn.execute_batch("COMMIT")?),
            _ => Ok(()),
        }
    }

    fn rollback(&self) {
        if let Some(conn) = self.connection.get() {
            if conn.is_autocommit() {
                return;
            }
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                tracing::warn!("rollback of test connection failed: {e}");
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => close_connection(conn),
            None => Ok(()),
        }
    }
}

impl Drop for FixtureContext<'_> {
    // Reached with an open transaction only when the body panicked
    fn drop(&mut self) {
        self.rollback();
    }
}

fn close_connection(conn: Connection) -> Result<()> {
    conn.close().map_err(|(_, e)| FixtureError::Sql(e))
}

/// Runs test bodies against declared fixtures
pub struct FixtureRunner {
    config: FixtureConfig,
    data_source: DataSource,
    parsers: ParserFactory,
}

impl FixtureRunner {
    /// Create a runner for the given connection settings
    pub fn new(config: FixtureConfig) -> Self {
        let data_source = DataSource::new(&config);
        Self {
            config,
            data_source,
            parsers: ParserFactory::new(),
        }
    }

    /// Create a runner from the process-wide configuration
    pub fn from_global() -> Self {
        Self::new(FixtureConfig::global().clone())
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    /// Load a dataset, resolving relative paths against the fixture root
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        self.parsers.load(&self.config.fixture_path(path))
    }

    /// Load a dataset and apply it with `operation`.
    ///
    /// Cells equal to `null_value` become nulls first; the remaining text is
    /// then typed by the live tables' declared column types.
    pub fn apply(
        &self,
        conn: &mut Connection,
        path: impl AsRef<Path>,
        operation: DatabaseOperation,
        null_value: Option<&str>,
    ) -> Result<()> {
        let raw = self.load(path)?;
        if operation == DatabaseOperation::None {
            return Ok(());
        }
        let dataset = with_null_value(DatasetBuilder::new(&raw), null_value).build()?;
        let dataset = conform_dataset(conn, &dataset)?;
        operation.execute(conn, &dataset)
    }

    /// Run a test body inside the fixture declared by `spec`.
    ///
    /// An error from the body comes back as [`FixtureError::Test`] holding
    /// the body's own error; a failed expectation as
    /// [`FixtureError::Mismatch`]. A panicking body rolls back its test
    /// connection and keeps unwinding.
    pub fn run<F, E>(&self, spec: &FixtureSpec, body: F) -> Result<()>
    where
        F: FnOnce(&FixtureContext<'_>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        tracing::info!(
            init = %spec.init.display(),
            operation = %spec.operation,
            "running fixture"
        );

        let setup = self.data_source.connection()?;
        let mut ctx = FixtureContext::new(&self.data_source);
        let (outcome, setup) = self.run_body(setup, spec, &ctx, body);

        if outcome.is_err() {
            ctx.rollback();
        }

        let test_closed = ctx.close();
        let setup_closed = close_connection(setup);
        outcome.and(test_closed).and(setup_closed)?;

        if let Some(expected) = &spec.expected {
            self.verify(expected, spec)?;
        }
        Ok(())
    }

    fn run_body<F, E>(
        &self,
        mut setup: Connection,
        spec: &FixtureSpec,
        ctx: &FixtureContext<'_>,
        body: F,
    ) -> (Result<()>, Connection)
    where
        F: FnOnce(&FixtureContext<'_>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        let outcome = self
            .apply(&mut setup, &spec.init, spec.operation, spec.null_value.as_deref())
            .and_then(|()| body(ctx).map_err(|e| FixtureError::Test(e.into())))
            .and_then(|()| ctx.commit());
        (outcome, setup)
    }

    /// Compare an expected dataset file with the live database.
    ///
    /// The expected side gets null substitution, typing by the live schema,
    /// exclusion and trimming; the live side, read for the expected tables
    /// only, gets exclusion and trimming.
    pub fn compare(&self, expected: impl AsRef<Path>, spec: &FixtureSpec) -> Result<ComparisonReport> {
        let raw_expected = self.load(expected)?;
        let substituted =
            with_null_value(DatasetBuilder::new(&raw_expected), spec.null_value.as_deref()).build()?;

        let conn = self.data_source.connection()?;
        let typed = conform_dataset(&conn, &substituted)?;
        let raw_actual = read_dataset(&conn, &typed.table_names())?;
        close_connection(conn)?;

        let expected = comparison_builder(&typed, spec).build()?;
        let actual = comparison_builder(&raw_actual, spec).build()?;

        let report = compare_datasets(&expected, &actual);
        tracing::debug!(
            tables = report.tables_compared,
            rows = report.rows_compared,
            mismatches = report.mismatches.len(),
            "compared datasets"
        );
        Ok(report)
    }

    /// Assert the live database matches an expected dataset file
    pub fn verify(&self, expected: impl AsRef<Path>, spec: &FixtureSpec) -> Result<()> {
        Ok(self.compare(expected, spec)?.into_result()?)
    }
}

fn comparison_builder<'a>(dataset: &'a Dataset, spec: &FixtureSpec) -> DatasetBuilder<'a> {
    DatasetBuilder::new(dataset)
        .exclude_columns(&spec.exclude_columns)
        .rtrim(spec.rtrim)
        .sorted(spec.sort == SortOrder::Auto)
}

/// Register the fixture text standing for null
fn with_null_value<'a>(builder: DatasetBuilder<'a>, sentinel: Option<&str>) -> DatasetBuilder<'a> {
    match sentinel {
        Some(sentinel) => builder.null_value(sentinel),
        None => builder,
    }
}
