//! Error types for schema loading and validation.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading or validating table declarations.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(keel::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema document is not valid TOML or does not match the expected shape.
    #[error("failed to parse schema: {message}")]
    #[diagnostic(code(keel::schema::parse_error))]
    ParseError { message: String },

    /// Invalid table definition.
    #[error("invalid table `{name}`: {message}")]
    #[diagnostic(code(keel::schema::invalid_table))]
    InvalidTable { name: String, message: String },

    /// Invalid field definition.
    #[error("invalid field `{table}.{field}`: {message}")]
    #[diagnostic(code(keel::schema::invalid_field))]
    InvalidField {
        table: String,
        field: String,
        message: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(keel::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Unknown field reference.
    #[error("unknown field `{field}` in table `{table}`")]
    #[diagnostic(code(keel::schema::unknown_field))]
    UnknownField { table: String, field: String },
}

impl SchemaError {
    /// Create an invalid table error.
    pub fn invalid_table(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTable {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        table: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            table: table.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl From<toml::de::Error> for SchemaError {
    fn from(err: toml::de::Error) -> Self {
        Self::ParseError {
            message: err.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::duplicate("table", "person");
        assert_eq!(err.to_string(), "duplicate table `person`");

        let err = SchemaError::unknown_field("person", "email");
        assert!(err.to_string().contains("person"));
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_from_toml_error() {
        let err: SchemaError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, SchemaError::ParseError { .. }));
    }
}
