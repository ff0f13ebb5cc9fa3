//! Table definitions.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::field::Field;
use crate::index::{Constraint, Index, PrimaryKey};

/// A table snapshot.
///
/// Tables are immutable values once they are registered: every schema
/// change produces a new snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Model name.
    pub name: String,
    /// Physical table name.
    pub table_name: String,
    /// Schema namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Composite indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    /// Named table constraints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Primary key.
    #[serde(default, skip_serializing_if = "PrimaryKey::is_none")]
    pub primary_key: PrimaryKey,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            schema: None,
            fields: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            primary_key: PrimaryKey::None,
        }
    }

    /// Add a field.
    ///
    /// An auto-incrementing field becomes the primary key when none is set.
    pub fn field(mut self, field: Field) -> Self {
        if self.primary_key.is_none() && field.field_type.is_auto() {
            self.primary_key = PrimaryKey::Field(field.name.clone());
        }
        self.fields.push(field);
        self
    }

    /// Add a composite index.
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Add a named constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set the schema namespace.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the primary key.
    pub fn primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a mutable field by name.
    pub fn get_field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Get a field by name, failing with [`SchemaError::UnknownField`].
    pub fn require_field(&self, name: &str) -> SchemaResult<&Field> {
        self.get_field(name)
            .ok_or_else(|| SchemaError::unknown_field(&self.table_name, name))
    }

    /// Get a field by its physical column name.
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column() == column)
    }

    /// Check if a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Replace a field by name, returning the previous definition.
    pub fn replace_field(&mut self, field: Field) -> Option<Field> {
        let slot = self.fields.iter_mut().find(|f| f.name == field.name)?;
        Some(std::mem::replace(slot, field))
    }

    /// Remove a field by name, returning it.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos))
    }

    /// Physical column names in field order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(Field::column).collect()
    }

    /// Fields that are foreign keys.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Tables this table references, excluding itself.
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.foreign_keys()
            .filter_map(Field::foreign_key_ref)
            .filter(|fk| !fk.is_self_reference() && fk.table != self.table_name)
            .map(|fk| fk.table.as_str())
            .collect()
    }

    /// Composite indexes that include `field`.
    pub fn indexes_with(&self, field: &str) -> Vec<&Index> {
        self.indexes
            .iter()
            .filter(|idx| idx.columns.iter().any(|c| c == field))
            .collect()
    }

    /// Move single-column entries of the index list onto the field flags and
    /// infer the primary key from an auto-incrementing field.
    pub fn normalize(&mut self) {
        if self.primary_key.is_none() {
            if let Some(auto) = self.fields.iter().find(|f| f.field_type.is_auto()) {
                self.primary_key = PrimaryKey::Field(auto.name.clone());
            }
        }

        let (single, composite): (Vec<Index>, Vec<Index>) = std::mem::take(&mut self.indexes)
            .into_iter()
            .partition(|idx| idx.columns.len() == 1);
        self.indexes = composite;

        for idx in single {
            if let Some(field) = self.get_field_mut(&idx.columns[0]) {
                if idx.unique {
                    field.unique = true;
                } else {
                    field.index = true;
                }
            }
        }
    }

    /// Validate field, index and key references.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.table_name.is_empty() {
            return Err(SchemaError::invalid_table(&self.name, "table name is empty"));
        }

        let mut names = BTreeSet::new();
        let mut columns = BTreeSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::duplicate(
                    "field",
                    format!("{}.{}", self.table_name, field.name),
                ));
            }
            if !columns.insert(field.column()) {
                return Err(SchemaError::duplicate(
                    "column",
                    format!("{}.{}", self.table_name, field.column()),
                ));
            }
        }

        for field in self.primary_key.fields() {
            self.require_field(field)?;
        }

        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(SchemaError::invalid_table(&self.table_name, "empty index"));
            }
            for column in &index.columns {
                self.require_field(column)?;
            }
        }

        Ok(())
    }
}

// Fields, indexes and constraints compare as sets; declaration order is
// not part of a table's identity.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name
            || self.table_name != other.table_name
            || self.schema != other.schema
            || self.primary_key != other.primary_key
            || self.fields.len() != other.fields.len()
        {
            return false;
        }

        let fields: IndexMap<&str, &Field> =
            self.fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let same_fields = other
            .fields
            .iter()
            .all(|f| fields.get(f.name.as_str()).is_some_and(|mine| *mine == f));

        let indexes: BTreeSet<_> = self.indexes.iter().map(Index::key).collect();
        let other_indexes: BTreeSet<_> = other.indexes.iter().map(Index::key).collect();

        let constraints: BTreeSet<_> = self.constraints.iter().map(|c| &c.name).collect();
        let other_constraints: BTreeSet<_> = other.constraints.iter().map(|c| &c.name).collect();

        same_fields && indexes == other_indexes && constraints == other_constraints
    }
}

/// Check that no two tables share a physical name.
pub fn check_unique_tables(tables: &[Table]) -> SchemaResult<()> {
    let mut seen = BTreeSet::new();
    for table in tables {
        if !seen.insert(table.table_name.as_str()) {
            return Err(SchemaError::duplicate("table", &table.table_name));
        }
    }
    Ok(())
}
