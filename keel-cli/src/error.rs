//! CLI error types and result alias.

use keel_migrate::MigrationError;
use keel_schema::SchemaError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(keel::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(keel::config))]
    Config(String),

    /// Schema error
    #[error("Schema error: {0}")]
    #[diagnostic(code(keel::schema))]
    Schema(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(keel::migration))]
    Migration(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(keel::database))]
    Database(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<SchemaError> for CliError {
    fn from(err: SchemaError) -> Self {
        CliError::Schema(err.to_string())
    }
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Config(msg) => CliError::Config(msg),
            MigrationError::Database(msg) => CliError::Database(msg),
            MigrationError::Schema(e) => CliError::Schema(e.to_string()),
            other => CliError::Migration(other.to_string()),
        }
    }
}
