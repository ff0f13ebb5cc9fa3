//! Literal values and column defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal SQL value.
///
/// Used for column defaults, raw statement parameters and rows returned by
/// an execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// SQL NULL.
    Null,
}

impl Literal {
    /// Check if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Null => write!(f, "NULL"),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// A literal default, rendered into the column definition.
    Value(Literal),
    /// A raw SQL expression such as `CURRENT_TIMESTAMP`.
    Expression(String),
    /// Computed by the application at insert time. Never diffed and never
    /// rendered into DDL.
    Computed,
}

impl DefaultValue {
    /// Create a literal default.
    pub fn value(value: impl Into<Literal>) -> Self {
        Self::Value(value.into())
    }

    /// Create an expression default.
    pub fn expression(sql: impl Into<String>) -> Self {
        Self::Expression(sql.into())
    }

    /// Check if this default is computed by the application.
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed)
    }

    /// Compare two optional defaults, ignoring computed ones.
    ///
    /// A computed default on either side hides the comparison entirely.
    pub fn differs(a: Option<&DefaultValue>, b: Option<&DefaultValue>) -> bool {
        let computed = |d: Option<&DefaultValue>| d.is_some_and(DefaultValue::is_computed);
        if computed(a) || computed(b) {
            return false;
        }
        a != b
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Expression(sql) => write!(f, "{}", sql),
            Self::Computed => write!(f, "<computed>"),
        }
    }
}
