//! dbfixture - Declarative database fixtures for tests
//!
//! Load a dataset file (CSV, a directory of CSVs, JSON or a spreadsheet)
//! into SQLite before a test, then check the tables against an expected
//! dataset afterwards:
//!
//! ```no_run
//! use dbfixture::{FixtureConfig, FixtureRunner, FixtureSpec};
//!
//! let runner = FixtureRunner::new(FixtureConfig::new("test.db"));
//! let spec = FixtureSpec::new("fixtures/emp.csv")
//!     .with_expected("fixtures/emp_after.csv")
//!     .with_exclude_columns(["empno"]);
//!
//! runner
//!     .run(&spec, |ctx| -> dbfixture::Result<()> {
//!         ctx.connection()?
//!             .execute("UPDATE emp SET ename = 'FORD' WHERE empno = 7566", [])?;
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

pub mod assertion;
pub mod builder;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod runner;

pub use assertion::{assert_dataset_eq, compare_datasets, ComparisonReport, DatasetMismatch};
pub use builder::{dataset, DatasetBuilder};
pub use config::{FixtureConfig, FixtureSpec, SortOrder};
pub use database::{DataSource, DatabaseOperation};
pub use error::{FixtureError, Result};
pub use model::{CellValue, Dataset, Table};
pub use parser::load_dataset;
pub use runner::{FixtureContext, FixtureRunner};
