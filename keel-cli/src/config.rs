//! CLI configuration handling.
//!
//! Settings come from `keel.toml` and are overridden by command-line flags:
//!
//! ```toml
//! [database]
//! url = "sqlite://app.db"
//!
//! [migrations]
//! directory = "migrations"
//! table_name = "migratehistory"
//! ignore = ["Audit"]
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use keel_migrate::{DEFAULT_HISTORY_TABLE, DialectKind, RouterConfig};

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "keel.toml";

/// Default migrations directory (relative to project root)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Keel CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file named by `--config`, else `./keel.toml` when present.
    pub fn discover(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file '{}' not found",
                        path.display()
                    )));
                }
                Self::load(path)
            }
            None => {
                let path = Path::new(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,

    /// SQL dialect (defaults to the one implied by the URL)
    pub dialect: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory for migration files
    pub directory: String,

    /// Migration table name
    pub table_name: String,

    /// Schema for the migration table
    pub schema: Option<String>,

    /// Model names skipped by `create --auto`
    pub ignore: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: MIGRATIONS_DIR.to_string(),
            table_name: DEFAULT_HISTORY_TABLE.to_string(),
            schema: None,
            ignore: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Output format (pretty, compact, json)
    pub format: Option<String>,
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// A SQLite database file.
    Sqlite(PathBuf),
    /// A private in-memory SQLite database.
    SqliteMemory,
}

impl DatabaseUrl {
    /// Parse `sqlite://<path>`, `sqlite::memory:` or a bare file path.
    pub fn parse(url: &str) -> CliResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CliError::Config("database URL is empty".to_string()));
        }
        if matches!(url, "sqlite::memory:" | ":memory:" | "sqlite://:memory:") {
            return Ok(Self::SqliteMemory);
        }
        if let Some(path) = url.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(CliError::Config(format!("missing path in '{}'", url)));
            }
            return Ok(Self::Sqlite(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(CliError::Config(format!(
                "unsupported database scheme '{}' (only sqlite is available)",
                scheme
            )));
        }
        Ok(Self::Sqlite(PathBuf::from(url)))
    }

    /// Dialect matching the database engine.
    pub fn dialect(&self) -> DialectKind {
        DialectKind::Sqlite
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(path) => write!(f, "sqlite://{}", path.display()),
            Self::SqliteMemory => write!(f, "sqlite::memory:"),
        }
    }
}

/// Configuration file merged with command-line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Database location
    pub database: DatabaseUrl,
    /// Migrations directory
    pub directory: PathBuf,
    /// Router configuration
    pub router: RouterConfig,
}

impl Settings {
    /// Resolve settings, flags taking precedence over the file.
    pub fn resolve(config: &Config, args: &GlobalArgs) -> CliResult<Self> {
        let url = args
            .database
            .clone()
            .or_else(|| config.database.url.clone())
            .ok_or_else(|| CliError::Config("Database is undefined".to_string()))?;
        let database = DatabaseUrl::parse(&url)?;

        let dialect = match &config.database.dialect {
            Some(name) => name.parse::<DialectKind>()?,
            None => database.dialect(),
        };
        if dialect != database.dialect() {
            return Err(CliError::Config(format!(
                "dialect '{}' does not match database '{}'",
                dialect, database
            )));
        }

        let directory = args
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.migrations.directory));
        let table = args
            .migratetable
            .clone()
            .unwrap_or_else(|| config.migrations.table_name.clone());

        let mut router = RouterConfig::new()
            .history_table(table)
            .ignore(config.migrations.ignore.iter().cloned())
            .dialect(dialect);
        if let Some(schema) = &config.migrations.schema {
            router = router.schema(schema.clone());
        }

        Ok(Self {
            database,
            directory,
            router,
        })
    }
}
