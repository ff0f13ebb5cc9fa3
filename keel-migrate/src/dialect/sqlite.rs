//! SQLite dialect.
//!
//! SQLite cannot alter a column in place. Everything beyond adding,
//! renaming and dropping plain columns goes through a table rebuild:
//!
//! 1. create `<table>__tmp__` from the post-change snapshot
//! 2. copy the snapshot's columns across
//! 3. drop the original table
//! 4. rename the copy into place
//! 5. recreate every index of the snapshot

use keel_schema::naming::rebuild_table_name;
use keel_schema::{DefaultValue, Field, FieldType, Literal, Table};

use super::{
    ColumnMode, Dialect, DialectKind, ansi_column_definition, auto_primary_key,
    foreign_column_type,
};
use crate::error::MigrateResult;
use crate::operation::{ForeignKeyConstraint, ObjectName, Statement};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Statements that rebuild `table` to match the snapshot.
    pub fn rebuild(&self, snapshot: &Table) -> Vec<Statement> {
        let table_ref = self.table_ref(snapshot);
        let tmp = ObjectName {
            schema: snapshot.schema.clone(),
            name: rebuild_table_name(&snapshot.table_name),
        };
        let tmp_ref = self.object(&tmp);

        // References inside the definition keep pointing at the real name.
        let create = self.create_table_statement(snapshot, false);
        let prefix = format!("CREATE TABLE {} (", table_ref);
        let create_tmp = match create.sql.strip_prefix(&prefix) {
            Some(rest) => format!("CREATE TABLE {} ({}", tmp_ref, rest),
            None => create.sql.clone(),
        };

        let columns: Vec<String> = snapshot
            .columns()
            .iter()
            .map(|c| self.quote(c))
            .collect();
        let columns = columns.join(", ");

        let mut stmts = vec![
            Statement::new(format!("DROP TABLE IF EXISTS {}", tmp_ref)),
            Statement::new(create_tmp),
            Statement::new(format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                tmp_ref, columns, columns, table_ref
            )),
            Statement::new(format!("DROP TABLE {}", table_ref)),
            Statement::new(format!(
                "ALTER TABLE {} RENAME TO {}",
                tmp_ref,
                self.quote(&snapshot.table_name)
            )),
        ];
        stmts.extend(self.index_statements(snapshot));
        stmts
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn inline_foreign_keys(&self) -> bool {
        true
    }

    fn column_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Auto
            | FieldType::BigAuto
            | FieldType::SmallInteger
            | FieldType::Integer
            | FieldType::BigInteger
            | FieldType::Boolean => "INTEGER".to_string(),
            FieldType::Float | FieldType::Double => "REAL".to_string(),
            FieldType::Decimal {
                max_digits,
                decimal_places,
                ..
            } => format!("DECIMAL({}, {})", max_digits, decimal_places),
            FieldType::Char { max_length } => format!("VARCHAR({})", max_length),
            FieldType::Text | FieldType::Json | FieldType::Uuid | FieldType::Array { .. } => {
                "TEXT".to_string()
            }
            FieldType::Date => "DATE".to_string(),
            FieldType::Time => "TIME".to_string(),
            FieldType::DateTime { .. } | FieldType::Timestamp => "DATETIME".to_string(),
            FieldType::Binary => "BLOB".to_string(),
            FieldType::ForeignKey(_) => self.column_type(&foreign_column_type(field_type)),
        }
    }

    fn literal(&self, value: &Literal) -> String {
        match value {
            Literal::Bool(true) => "1".to_string(),
            Literal::Bool(false) => "0".to_string(),
            other => other.to_string(),
        }
    }

    fn column_definition(&self, table: &Table, field: &Field, mode: ColumnMode) -> String {
        let definition = ansi_column_definition(self, table, field, mode);
        let is_auto_key = auto_primary_key(table).is_some_and(|pk| pk.name == field.name);
        if mode == ColumnMode::Create && is_auto_key {
            format!("{} PRIMARY KEY", definition)
        } else {
            definition
        }
    }

    fn primary_key_clause(&self, table: &Table) -> Option<String> {
        if auto_primary_key(table).is_some() {
            return None;
        }
        let fields = table.primary_key.fields();
        if fields.is_empty() {
            return None;
        }
        let columns: Vec<String> = fields
            .iter()
            .map(|name| {
                let column = table
                    .get_field(name)
                    .map(Field::column)
                    .unwrap_or_else(|| name.to_string());
                self.quote(&column)
            })
            .collect();
        Some(format!("PRIMARY KEY ({})", columns.join(", ")))
    }

    fn add_index(
        &self,
        table: &ObjectName,
        name: &str,
        columns: &[String],
        unique: bool,
    ) -> Statement {
        let cols: Vec<String> = columns.iter().map(|c| self.quote(c)).collect();
        // Rebuilds recreate indexes that a later queued operation adds again.
        Statement::new(format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote(name),
            self.object(table),
            cols.join(", ")
        ))
    }

    fn drop_index(&self, table: &ObjectName, name: &str) -> MigrateResult<Vec<Statement>> {
        let index = ObjectName {
            schema: table.schema.clone(),
            name: name.to_string(),
        };
        Ok(vec![Statement::new(format!(
            "DROP INDEX IF EXISTS {}",
            self.object(&index)
        ))])
    }

    fn drop_table(&self, table: &ObjectName, _cascade: bool) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "DROP TABLE IF EXISTS {}",
            self.object(table)
        ))])
    }

    fn drop_column(
        &self,
        table: &Table,
        _column: &str,
        _cascade: bool,
        _foreign_key: Option<&str>,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn change_column(
        &self,
        table: &Table,
        _field: &Field,
        _previous: &Field,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn add_not_null(&self, table: &Table, _column: &str) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn drop_not_null(&self, table: &Table, _column: &str) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn set_default(
        &self,
        table: &Table,
        _column: &str,
        _default: &DefaultValue,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn add_foreign_key(
        &self,
        table: &Table,
        _constraint: &ForeignKeyConstraint,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn drop_foreign_key(&self, table: &Table, _name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn add_constraint(
        &self,
        table: &Table,
        _name: &str,
        _definition: &str,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }

    fn drop_constraint(&self, table: &Table, _name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(self.rebuild(table))
    }
}
