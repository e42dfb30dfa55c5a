//! Configuration handling for dbfixture

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::database::DatabaseOperation;
use crate::error::{FixtureError, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DBFIXTURE_CONFIG";
/// Environment variable overriding the database URL
pub const URL_ENV: &str = "DBFIXTURE_URL";
/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dbfixture.toml";

/// Database driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Driver {
    #[default]
    Sqlite,
}

impl std::str::FromStr for Driver {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(FixtureError::UnsupportedDriver(s.to_string())),
        }
    }
}

/// Raw config file contents
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    driver: Option<String>,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    busy_timeout_ms: Option<u64>,
    fixture_root: Option<PathBuf>,
}

/// Process-wide connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Database driver
    pub driver: Driver,
    /// Database path or `file:` URI
    pub url: String,
    /// Accepted so config files stay portable; SQLite has no credentials
    pub username: Option<String>,
    pub password: Option<String>,
    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// Base directory for relative fixture paths
    pub fixture_root: PathBuf,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Sqlite,
            url: "dbfixture.db".to_string(),
            username: None,
            password: None,
            busy_timeout_ms: 5_000,
            fixture_root: PathBuf::new(),
        }
    }
}

impl FixtureConfig {
    /// Create a config for a database URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Parse TOML config text
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        let defaults = Self::default();
        Ok(Self {
            driver: match file.driver {
                Some(d) => d.parse()?,
                None => defaults.driver,
            },
            url: file.url.unwrap_or(defaults.url),
            username: file.username,
            password: file.password,
            busy_timeout_ms: file.busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
            fixture_root: file.fixture_root.unwrap_or(defaults.fixture_root),
        })
    }

    /// Load a TOML config file; a relative `fixture_root` is resolved
    /// against the file's directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| FixtureError::io(path, e))?;
        let mut config = Self::from_toml(&text)?;
        if config.fixture_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.fixture_root = dir.join(&config.fixture_root);
            }
        }
        Ok(config)
    }

    /// Resolve config from the environment: `$DBFIXTURE_CONFIG`, else
    /// `dbfixture.toml` when present, else defaults; `$DBFIXTURE_URL`
    /// overrides the URL.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(URL_ENV) {
            config.url = url;
        }
        Ok(config)
    }

    /// Config shared by the whole process, resolved once by [`from_env`].
    ///
    /// # Panics
    ///
    /// Panics when the configuration cannot be loaded, like a test harness
    /// failing to boot.
    ///
    /// [`from_env`]: FixtureConfig::from_env
    pub fn global() -> &'static FixtureConfig {
        static GLOBAL: OnceLock<FixtureConfig> = OnceLock::new();
        GLOBAL.get_or_init(|| match Self::from_env() {
            Ok(config) => {
                tracing::debug!(url = %config.url, "loaded fixture config");
                config
            }
            Err(e) => panic!("failed to load dbfixture configuration: {e}"),
        })
    }

    /// Set the fixture root directory
    pub fn with_fixture_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fixture_root = root.into();
        self
    }

    /// Set the busy timeout
    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Resolve a fixture path against the fixture root
    pub fn fixture_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.fixture_root.join(path)
        }
    }
}

/// Row ordering applied before comparing datasets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort every table by all of its columns
    #[default]
    Auto,
    /// Keep file order and primary key order
    None,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SortOrder::Auto),
            "none" => Ok(SortOrder::None),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Fixture declaration for one test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSpec {
    /// Initial dataset file
    pub init: PathBuf,
    /// Expected dataset file, checked after the test
    pub expected: Option<PathBuf>,
    /// Operation applying the initial dataset
    pub operation: DatabaseOperation,
    /// Columns left out of the comparison (`"col"` or `"table.col"`)
    pub exclude_columns: Vec<String>,
    /// Fixture text standing for null
    pub null_value: Option<String>,
    /// Strip trailing spaces from strings before comparing
    pub rtrim: bool,
    /// Row ordering before comparing
    pub sort: SortOrder,
}

impl FixtureSpec {
    /// Create a spec with an initial dataset file
    pub fn new(init: impl Into<PathBuf>) -> Self {
        Self {
            init: init.into(),
            ..Default::default()
        }
    }

    /// Set the expected dataset file
    pub fn with_expected(mut self, expected: impl Into<PathBuf>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Set the setup operation
    pub fn with_operation(mut self, operation: DatabaseOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Set columns to exclude from the comparison
    pub fn with_exclude_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the null sentinel
    pub fn with_null_value(mut self, value: impl Into<String>) -> Self {
        self.null_value = Some(value.into());
        self
    }

    /// Enable trailing-space trimming
    pub fn with_rtrim(mut self, rtrim: bool) -> Self {
        self.rtrim = rtrim;
        self
    }

    /// Set row ordering
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}
