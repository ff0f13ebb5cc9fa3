//! Composite indexes, primary keys and named constraints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A multi-column index.
///
/// Columns are field names of the owning table. Single-column indexes are
/// carried by the field's `unique`/`index` flags instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    /// Indexed fields, in index order.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    /// Create a non-unique index.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Create a unique index.
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique: true,
            ..Self::new(columns)
        }
    }

    /// Identity used for diffing: the set of columns plus uniqueness.
    pub fn key(&self) -> (BTreeSet<&str>, bool) {
        (self.column_set(), self.unique)
    }

    /// The set of indexed columns.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Check whether this index covers exactly `columns`, in any order.
    pub fn covers<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        let other: BTreeSet<&str> = columns.iter().map(AsRef::as_ref).collect();
        self.column_set() == other
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// Primary key definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    /// Single-field key.
    Field(String),
    /// Composite key over several fields.
    Composite(Vec<String>),
    /// No primary key.
    #[default]
    None,
}

impl PrimaryKey {
    /// Check if there is no primary key.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Fields making up the key.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Field(name) => vec![name.as_str()],
            Self::Composite(names) => names.iter().map(String::as_str).collect(),
            Self::None => Vec::new(),
        }
    }

    /// Check if `field` is part of the key.
    pub fn contains(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    /// Rename a field of the key.
    pub fn rename(&mut self, old: &str, new: &str) {
        match self {
            Self::Field(name) if name == old => *name = new.to_string(),
            Self::Composite(names) => {
                for name in names.iter_mut().filter(|n| n.as_str() == old) {
                    *name = new.to_string();
                }
            }
            _ => {}
        }
    }

    /// Remove a field from the key.
    pub fn remove(&mut self, field: &str) {
        match self {
            Self::Field(name) if name == field => *self = Self::None,
            Self::Composite(names) => {
                names.retain(|n| n != field);
                if names.is_empty() {
                    *self = Self::None;
                }
            }
            _ => {}
        }
    }
}

/// A named table constraint such as `CHECK (price > 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Definition following `CONSTRAINT <name>`.
    pub definition: String,
}

impl Constraint {
    /// Create a named constraint.
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}
