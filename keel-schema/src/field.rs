//! Field descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{FieldType, ForeignKey};
use crate::value::DefaultValue;

/// A field of a table.
///
/// Fields are value objects: changing a field means replacing it in its
/// table snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Logical field name.
    pub name: String,
    /// Explicit column name. Derived from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Logical type and its parameters.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether the column accepts NULL.
    #[serde(default, skip_serializing_if = "is_false")]
    pub null: bool,
    /// Whether the column carries a unique index.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    /// Whether the column carries a non-unique index.
    #[serde(default, skip_serializing_if = "is_false")]
    pub index: bool,
    /// Column default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Field {
    /// Create a NOT NULL field without indexes.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column_name: None,
            field_type,
            null: false,
            unique: false,
            index: false,
            default: None,
        }
    }

    /// Create a foreign key field.
    pub fn foreign_key(name: impl Into<String>, fk: ForeignKey) -> Self {
        Self::new(name, FieldType::ForeignKey(fk))
    }

    /// Set nullability.
    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    /// Set the unique flag.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set the index flag.
    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    /// Set an explicit column name.
    pub fn column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    /// Set the default.
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Physical column name.
    ///
    /// Foreign keys get an `_id` suffix unless the name already ends with it.
    pub fn column(&self) -> String {
        if let Some(column) = &self.column_name {
            return column.clone();
        }
        if self.is_foreign_key() && !self.name.ends_with("_id") {
            format!("{}_id", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Check if the column carries any single-column index.
    pub fn indexed(&self) -> bool {
        self.index || self.unique
    }

    /// Check if this is a foreign key.
    pub fn is_foreign_key(&self) -> bool {
        matches!(self.field_type, FieldType::ForeignKey(_))
    }

    /// Foreign key descriptor, if any.
    pub fn foreign_key_ref(&self) -> Option<&ForeignKey> {
        self.field_type.as_foreign_key()
    }

    /// Compare everything except the null, unique and index flags.
    ///
    /// This is what a batched field change carries; the flags are toggled
    /// by dedicated operations.
    pub fn definition_differs(&self, other: &Field) -> bool {
        self.field_type != other.field_type
            || self.column() != other.column()
            || DefaultValue::differs(self.default.as_ref(), other.default.as_ref())
    }

    /// Names of everything that differs from `other`, including flags.
    pub fn changes(&self, other: &Field) -> Vec<&'static str> {
        let mut changes = self.field_type.param_changes(&other.field_type);
        if self.column() != other.column() {
            changes.push("column_name");
        }
        if DefaultValue::differs(self.default.as_ref(), other.default.as_ref()) {
            changes.push("default");
        }
        if self.null != other.null {
            changes.push("null");
        }
        if self.unique != other.unique {
            changes.push("unique");
        }
        if self.indexed() != other.indexed() {
            changes.push("index");
        }
        changes
    }
}

// Semantic equality: `index` is compared as `index || unique` and the
// column is compared after derivation.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.changes(other).is_empty()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.field_type)?;
        if self.null {
            write!(f, " null")?;
        }
        if self.unique {
            write!(f, " unique")?;
        } else if self.index {
            write!(f, " index")?;
        }
        if let Some(default) = &self.default {
            write!(f, " default={}", default)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForeignKey;

    #[test]
    fn test_derived_column() {
        assert_eq!(Field::new("name", FieldType::Text).column(), "name");
        assert_eq!(
            Field::foreign_key("owner", ForeignKey::new("person")).column(),
            "owner_id"
        );
        assert_eq!(
            Field::foreign_key("owner_id", ForeignKey::new("person")).column(),
            "owner_id"
        );
        assert_eq!(
            Field::new("name", FieldType::Text)
                .column_name("full_name")
                .column(),
            "full_name"
        );
    }

    #[test]
    fn test_index_and_unique_are_distinct() {
        let indexed = Field::new("email", FieldType::char(255)).index(true);
        let unique = Field::new("email", FieldType::char(255)).unique(true);

        assert!(indexed.indexed());
        assert!(unique.indexed());
        assert_ne!(indexed, unique);
        assert_eq!(indexed.changes(&unique), vec!["unique"]);
    }

    #[test]
    fn test_unique_implies_index() {
        let a = Field::new("email", FieldType::Text).unique(true).index(true);
        let b = Field::new("email", FieldType::Text).unique(true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_column_equals_derived() {
        let a = Field::new("name", FieldType::Text).column_name("name");
        let b = Field::new("name", FieldType::Text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_definition_differs_excludes_flags() {
        let a = Field::new("age", FieldType::Integer);
        let b = Field::new("age", FieldType::Integer).null(true).unique(true);
        assert!(!a.definition_differs(&b));

        let c = Field::new("age", FieldType::BigInteger);
        assert!(a.definition_differs(&c));
    }

    #[test]
    fn test_field_toml_shape() {
        let field: Field = toml::from_str(
            r#"
            name = "email"
            type = "char"
            max_length = 120
            null = true
            unique = true
            "#,
        )
        .unwrap();

        assert_eq!(field.field_type, FieldType::char(120));
        assert!(field.null);
        assert!(field.unique);
        assert!(!field.index);
    }

    #[test]
    fn test_foreign_key_toml_shape() {
        let field: Field = toml::from_str(
            r#"
            name = "owner"
            type = "foreign_key"
            table = "person"
            on_delete = "CASCADE"
            "#,
        )
        .unwrap();

        let fk = field.foreign_key_ref().unwrap();
        assert_eq!(fk.table, "person");
        assert_eq!(fk.field, "id");
        assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));
        assert_eq!(field.column(), "owner_id");
    }
}
