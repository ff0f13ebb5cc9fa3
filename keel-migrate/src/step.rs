//! Declarative migration steps.
//!
//! A [`Step`] is one migrator call in data form. The differ produces steps,
//! migration files persist them and [`Step::apply`] replays them.

use std::fmt;

use keel_schema::{DefaultValue, Field, Literal, Table};
use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;
use crate::migrator::Migrator;

/// One migrator call. Tables are referenced by table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create a table.
    CreateTable {
        /// Full table definition.
        table: Table,
    },
    /// Drop a table.
    RemoveTable {
        /// Table name.
        table: String,
        /// Drop dependent objects.
        #[serde(default, skip_serializing_if = "is_false")]
        cascade: bool,
    },
    /// Add fields.
    AddFields {
        /// Table name.
        table: String,
        /// New fields.
        fields: Vec<Field>,
    },
    /// Replace field definitions.
    ChangeFields {
        /// Table name.
        table: String,
        /// New definitions.
        fields: Vec<Field>,
    },
    /// Remove fields.
    RemoveFields {
        /// Table name.
        table: String,
        /// Field names.
        fields: Vec<String>,
        /// Drop dependent objects.
        #[serde(default, skip_serializing_if = "is_false")]
        cascade: bool,
    },
    /// Rename a field.
    RenameField {
        /// Table name.
        table: String,
        /// Current field name.
        old_name: String,
        /// New field name.
        new_name: String,
    },
    /// Rename a table.
    RenameTable {
        /// Current table name.
        table: String,
        /// New table name.
        new_name: String,
    },
    /// Add an index.
    AddIndex {
        /// Table name.
        table: String,
        /// Indexed field names.
        columns: Vec<String>,
        /// Unique index.
        #[serde(default, skip_serializing_if = "is_false")]
        unique: bool,
    },
    /// Drop an index.
    DropIndex {
        /// Table name.
        table: String,
        /// Indexed field names.
        columns: Vec<String>,
    },
    /// Make fields NOT NULL.
    AddNotNull {
        /// Table name.
        table: String,
        /// Field names.
        fields: Vec<String>,
    },
    /// Make fields nullable.
    DropNotNull {
        /// Table name.
        table: String,
        /// Field names.
        fields: Vec<String>,
    },
    /// Set a default.
    AddDefault {
        /// Table name.
        table: String,
        /// Field name.
        field: String,
        /// The default.
        default: DefaultValue,
    },
    /// Add a named constraint.
    AddConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Constraint definition.
        definition: String,
    },
    /// Drop named constraints.
    DropConstraints {
        /// Table name.
        table: String,
        /// Constraint names.
        names: Vec<String>,
    },
    /// Raw statement.
    Sql {
        /// Statement text.
        sql: String,
        /// Positional parameters.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Literal>,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Step {
    /// Replay the step against a migrator.
    pub fn apply(&self, migrator: &mut Migrator) -> MigrateResult<()> {
        match self {
            Self::CreateTable { table } => {
                migrator.create_table(table.clone())?;
            }
            Self::RemoveTable { table, cascade } => migrator.remove_table(table, *cascade)?,
            Self::AddFields { table, fields } => {
                migrator.add_fields(table, fields.iter().cloned())?;
            }
            Self::ChangeFields { table, fields } => {
                migrator.change_fields(table, fields.iter().cloned())?;
            }
            Self::RemoveFields {
                table,
                fields,
                cascade,
            } => {
                migrator.remove_fields(table, fields, *cascade)?;
            }
            Self::RenameField {
                table,
                old_name,
                new_name,
            } => {
                migrator.rename_field(table, old_name, new_name)?;
            }
            Self::RenameTable { table, new_name } => {
                migrator.rename_table(table, new_name)?;
            }
            Self::AddIndex {
                table,
                columns,
                unique,
            } => {
                migrator.add_index(table, columns, *unique)?;
            }
            Self::DropIndex { table, columns } => {
                migrator.drop_index(table, columns)?;
            }
            Self::AddNotNull { table, fields } => {
                migrator.add_not_null(table, fields)?;
            }
            Self::DropNotNull { table, fields } => {
                migrator.drop_not_null(table, fields)?;
            }
            Self::AddDefault {
                table,
                field,
                default,
            } => {
                migrator.add_default(table, field, default.clone())?;
            }
            Self::AddConstraint {
                table,
                name,
                definition,
            } => {
                migrator.add_constraint(table, name, definition)?;
            }
            Self::DropConstraints { table, names } => {
                migrator.drop_constraints(table, names)?;
            }
            Self::Sql { sql, params } => migrator.sql(sql.clone(), params.clone()),
        }
        Ok(())
    }

    /// Name of the migrator call.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "create_table",
            Self::RemoveTable { .. } => "remove_table",
            Self::AddFields { .. } => "add_fields",
            Self::ChangeFields { .. } => "change_fields",
            Self::RemoveFields { .. } => "remove_fields",
            Self::RenameField { .. } => "rename_field",
            Self::RenameTable { .. } => "rename_table",
            Self::AddIndex { .. } => "add_index",
            Self::DropIndex { .. } => "drop_index",
            Self::AddNotNull { .. } => "add_not_null",
            Self::DropNotNull { .. } => "drop_not_null",
            Self::AddDefault { .. } => "add_default",
            Self::AddConstraint { .. } => "add_constraint",
            Self::DropConstraints { .. } => "drop_constraints",
            Self::Sql { .. } => "sql",
        }
    }

    /// Table the step works on, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::CreateTable { table } => Some(&table.table_name),
            Self::RemoveTable { table, .. }
            | Self::AddFields { table, .. }
            | Self::ChangeFields { table, .. }
            | Self::RemoveFields { table, .. }
            | Self::RenameField { table, .. }
            | Self::RenameTable { table, .. }
            | Self::AddIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::AddNotNull { table, .. }
            | Self::DropNotNull { table, .. }
            | Self::AddDefault { table, .. }
            | Self::AddConstraint { table, .. }
            | Self::DropConstraints { table, .. } => Some(table),
            Self::Sql { .. } => None,
        }
    }
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("'{}'", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::CreateTable { table } => {
                let fields: Vec<String> = table.fields.iter().map(|f| f.name.clone()).collect();
                write!(f, "{}('{}', {})", name, table.table_name, fields.join(", "))
            }
            Self::RemoveTable { table, cascade } => {
                write!(f, "{}('{}'", name, table)?;
                if *cascade {
                    write!(f, ", cascade")?;
                }
                write!(f, ")")
            }
            Self::AddFields { table, fields } | Self::ChangeFields { table, fields } => {
                let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                write!(f, "{}('{}', {})", name, table, fields.join(", "))
            }
            Self::RemoveFields {
                table,
                fields,
                cascade,
            } => {
                write!(f, "{}('{}', {}", name, table, quoted(fields))?;
                if *cascade {
                    write!(f, ", cascade")?;
                }
                write!(f, ")")
            }
            Self::RenameField {
                table,
                old_name,
                new_name,
            } => write!(f, "{}('{}', '{}', '{}')", name, table, old_name, new_name),
            Self::RenameTable { table, new_name } => {
                write!(f, "{}('{}', '{}')", name, table, new_name)
            }
            Self::AddIndex {
                table,
                columns,
                unique,
            } => {
                write!(f, "{}('{}', {}", name, table, quoted(columns))?;
                if *unique {
                    write!(f, ", unique")?;
                }
                write!(f, ")")
            }
            Self::DropIndex { table, columns } => {
                write!(f, "{}('{}', {})", name, table, quoted(columns))
            }
            Self::AddNotNull { table, fields } | Self::DropNotNull { table, fields } => {
                write!(f, "{}('{}', {})", name, table, quoted(fields))
            }
            Self::AddDefault {
                table,
                field,
                default,
            } => write!(f, "{}('{}', '{}', {})", name, table, field, default),
            Self::AddConstraint {
                table,
                name: constraint,
                definition,
            } => write!(f, "{}('{}', '{}', \"{}\")", name, table, constraint, definition),
            Self::DropConstraints { table, names } => {
                write!(f, "{}('{}', {})", name, table, quoted(names))
            }
            Self::Sql { sql, .. } => write!(f, "{}(\"{}\")", name, sql),
        }
    }
}

/// Replay a list of steps.
pub fn apply_steps(steps: &[Step], migrator: &mut Migrator) -> MigrateResult<()> {
    for step in steps {
        step.apply(migrator)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_schema::FieldType;
    use pretty_assertions::assert_eq;

    fn person() -> Table {
        Table::new("Person", "person")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::new("name", FieldType::char(100)))
    }

    #[test]
    fn test_apply_replays_calls() {
        let mut m = Migrator::default();
        let steps = vec![
            Step::CreateTable { table: person() },
            Step::AddFields {
                table: "person".into(),
                fields: vec![Field::new("email", FieldType::char(255)).null(true)],
            },
            Step::AddIndex {
                table: "person".into(),
                columns: vec!["email".into()],
                unique: true,
            },
            Step::RenameTable {
                table: "person".into(),
                new_name: "people".into(),
            },
        ];
        apply_steps(&steps, &mut m).unwrap();

        let table = m.table("people").unwrap();
        assert!(table.get_field("email").unwrap().unique);
        assert!(m.table("person").is_err());
    }

    #[test]
    fn test_display() {
        let step = Step::RemoveFields {
            table: "person".into(),
            fields: vec!["age".into()],
            cascade: false,
        };
        assert_eq!(step.to_string(), "remove_fields('person', 'age')");

        let step = Step::AddIndex {
            table: "person".into(),
            columns: vec!["email".into()],
            unique: true,
        };
        assert_eq!(step.to_string(), "add_index('person', 'email', unique)");
        assert_eq!(step.table(), Some("person"));
    }

    #[test]
    fn test_toml_shape() {
        #[derive(Serialize, Deserialize)]
        struct Doc {
            upgrade: Vec<Step>,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[upgrade]]
            op = "add_fields"
            table = "person"
            fields = [{ name = "age", type = "integer", null = true }]

            [[upgrade]]
            op = "add_not_null"
            table = "person"
            fields = ["age"]
            "#,
        )
        .unwrap();
        assert_eq!(doc.upgrade.len(), 2);
        assert_eq!(doc.upgrade[0].name(), "add_fields");
        match &doc.upgrade[0] {
            Step::AddFields { fields, .. } => {
                assert_eq!(fields[0].field_type, FieldType::Integer);
                assert!(fields[0].null);
            }
            other => panic!("unexpected {:?}", other),
        }

        let text = toml::to_string(&doc).unwrap();
        let again: Doc = toml::from_str(&text).unwrap();
        assert_eq!(again.upgrade, doc.upgrade);
    }
}
