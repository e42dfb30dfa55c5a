//! dbfixture - Load, verify and inspect database fixtures

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use dbfixture::config::{FixtureConfig, FixtureSpec, SortOrder};
use dbfixture::database::{read_table, table_names, DatabaseOperation};
use dbfixture::output::{render_table, render_to_stdout, ReportFormat};
use dbfixture::FixtureRunner;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportFormat {
    Terminal,
    Json,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(f: CliReportFormat) -> Self {
        match f {
            CliReportFormat::Terminal => ReportFormat::Terminal,
            CliReportFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSortOrder {
    Auto,
    None,
}

impl From<CliSortOrder> for SortOrder {
    fn from(s: CliSortOrder) -> Self {
        match s {
            CliSortOrder::Auto => SortOrder::Auto,
            CliSortOrder::None => SortOrder::None,
        }
    }
}

/// Declarative database fixtures (CSV, Excel, JSON datasets over SQLite)
#[derive(Parser, Debug)]
#[command(name = "dbfixture")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $DBFIXTURE_CONFIG, then ./dbfixture.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the configured URL
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a dataset file to the database
    Load {
        /// Dataset file or directory of CSV files
        fixture: PathBuf,

        /// How the dataset is applied
        #[arg(short, long, default_value = "clean-insert")]
        operation: DatabaseOperation,

        /// Cell text standing for null
        #[arg(long)]
        null_value: Option<String>,
    },

    /// Compare the database with an expected dataset file
    Verify {
        /// Expected dataset file or directory of CSV files
        expected: PathBuf,

        /// Column(s) to leave out, as `col` or `table.col` (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Cell text standing for null
        #[arg(long)]
        null_value: Option<String>,

        /// Strip trailing spaces from strings before comparing
        #[arg(long)]
        rtrim: bool,

        /// Row ordering before comparing
        #[arg(long, value_enum, default_value = "auto")]
        sort: CliSortOrder,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliReportFormat,
    },

    /// Print live tables (all tables when none are named)
    Dump {
        tables: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1), // Mismatch
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FixtureConfig> {
    let mut config = match &cli.config {
        Some(path) => FixtureConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => FixtureConfig::from_env().context("Failed to load config")?,
    };
    if let Some(url) = &cli.database {
        config.url = url.clone();
    }
    Ok(config)
}

/// Returns whether the database matched, for commands that compare
fn run() -> Result<bool> {
    let cli = Cli::parse();
    let runner = FixtureRunner::new(load_config(&cli)?);

    match cli.command {
        Command::Load {
            fixture,
            operation,
            null_value,
        } => {
            load(&runner, &fixture, operation, null_value.as_deref())?;
            Ok(true)
        }
        Command::Verify {
            expected,
            exclude,
            null_value,
            rtrim,
            sort,
            format,
        } => {
            let mut spec = FixtureSpec::default()
                .with_exclude_columns(exclude)
                .with_rtrim(rtrim)
                .with_sort(sort.into());
            if let Some(null_value) = null_value {
                spec = spec.with_null_value(null_value);
            }

            let report = runner
                .compare(&expected, &spec)
                .with_context(|| format!("Failed to verify against: {}", expected.display()))?;
            render_to_stdout(&report, &expected, format.into())?;
            Ok(report.is_match())
        }
        Command::Dump { tables } => {
            dump(&runner, &tables)?;
            Ok(true)
        }
    }
}

fn load(
    runner: &FixtureRunner,
    fixture: &Path,
    operation: DatabaseOperation,
    null_value: Option<&str>,
) -> Result<()> {
    let mut conn = runner
        .data_source()
        .connection()
        .with_context(|| format!("Failed to open database: {}", runner.data_source().url()))?;
    runner
        .apply(&mut conn, fixture, operation, null_value)
        .with_context(|| format!("Failed to load fixture: {}", fixture.display()))?;
    println!("Applied {} from {}", operation, fixture.display());
    Ok(())
}

fn dump(runner: &FixtureRunner, tables: &[String]) -> Result<()> {
    let conn = runner
        .data_source()
        .connection()
        .with_context(|| format!("Failed to open database: {}", runner.data_source().url()))?;
    let names = if tables.is_empty() {
        table_names(&conn)?
    } else {
        tables.to_vec()
    };

    for name in &names {
        let table = read_table(&conn, name).with_context(|| format!("Failed to read table: {name}"))?;
        println!("{} ({} rows)", table.name, table.row_count());
        println!("{}", render_table(&table));
    }
    Ok(())
}
