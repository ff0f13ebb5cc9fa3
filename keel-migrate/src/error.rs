//! Error types for the migration engine.

use std::fmt;

use keel_schema::SchemaError;
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Direction a migration was running in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Applying an upgrade.
    Up,
    /// Applying a downgrade.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "Migration"),
            Self::Down => write!(f, "Rollback"),
        }
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// Schema model error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Invalid configuration, detected at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid migration file or format.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// Migration, table or field not found.
    #[error("'{0}' not found")]
    NotFound(String),

    /// The two schemas being compared are inconsistent.
    #[error("Diff inconsistency: {0}")]
    DiffInconsistency(String),

    /// The dialect cannot express an operation.
    #[error("Unsupported operation for {dialect}: {operation}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation description.
        operation: String,
    },

    /// No changes to migrate.
    #[error("No schema changes detected")]
    NoChanges,

    /// Rollback precondition violated.
    #[error("Cannot rollback: {0}")]
    RollbackFailed(String),

    /// A migration failed while running and was rolled back.
    #[error("{direction} failed: {name}: {source}")]
    Failed {
        /// Direction of the failed run.
        direction: Direction,
        /// Migration name.
        name: String,
        /// Underlying error.
        #[source]
        source: Box<MigrationError>,
    },

    /// General migration error.
    #[error("Migration error: {0}")]
    Other(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a migration file error.
    pub fn migration_file(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Create a diff inconsistency error.
    pub fn diff_inconsistency(msg: impl Into<String>) -> Self {
        Self::DiffInconsistency(msg.into())
    }

    /// Create a rollback precondition error.
    pub fn rollback(msg: impl Into<String>) -> Self {
        Self::RollbackFailed(msg.into())
    }

    /// Create an unsupported operation error.
    pub fn unsupported(dialect: &'static str, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            operation: operation.into(),
        }
    }

    /// Wrap an error raised while running a migration.
    pub fn failed(direction: Direction, name: impl Into<String>, source: MigrationError) -> Self {
        Self::Failed {
            direction,
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create an other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this is a recoverable error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoChanges)
    }
}

impl From<toml::de::Error> for MigrationError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidMigration(format!("Failed to parse TOML: {}", err.message()))
    }
}

impl From<toml::ser::Error> for MigrationError {
    fn from(err: toml::ser::Error) -> Self {
        Self::InvalidMigration(format!("Failed to serialize TOML: {}", err))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for MigrationError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrationError::not_found("001_initial");
        assert!(err.to_string().contains("001_initial"));
    }

    #[test]
    fn test_failed_display_carries_direction_and_name() {
        let err = MigrationError::failed(
            Direction::Up,
            "002_add_email",
            MigrationError::database("no such table: person"),
        );
        assert_eq!(
            err.to_string(),
            "Migration failed: 002_add_email: Database error: no such table: person"
        );

        let err = MigrationError::failed(
            Direction::Down,
            "002_add_email",
            MigrationError::database("boom"),
        );
        assert!(err.to_string().starts_with("Rollback failed: 002_add_email"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(MigrationError::NoChanges.is_recoverable());
        assert!(!MigrationError::database("connection").is_recoverable());
    }
}
