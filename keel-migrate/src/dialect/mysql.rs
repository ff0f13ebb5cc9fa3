//! MySQL dialect.

use keel_schema::{DefaultValue, Field, FieldType, Literal, Table};

use super::{ColumnMode, Dialect, DialectKind, foreign_column_type};
use crate::error::{MigrateResult, MigrationError};
use crate::operation::{ObjectName, Statement};

/// MySQL dialect.
///
/// MySQL has no `ALTER COLUMN .. SET NOT NULL`; nullability and type
/// changes are expressed as a full `MODIFY COLUMN` redefinition built from
/// the table snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    fn modify_column(&self, table: &Table, field: &Field) -> Statement {
        Statement::new(format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.table_ref(table),
            self.column_definition(table, field, ColumnMode::Modify)
        ))
    }

    fn snapshot_field<'a>(&self, table: &'a Table, column: &str) -> MigrateResult<&'a Field> {
        table
            .field_by_column(column)
            .ok_or_else(|| MigrationError::not_found(format!("{}.{}", table.table_name, column)))
    }
}

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn column_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Auto => "INT AUTO_INCREMENT".to_string(),
            FieldType::BigAuto => "BIGINT AUTO_INCREMENT".to_string(),
            FieldType::Integer => "INT".to_string(),
            FieldType::SmallInteger => "SMALLINT".to_string(),
            FieldType::BigInteger => "BIGINT".to_string(),
            FieldType::Float => "FLOAT".to_string(),
            FieldType::Double => "DOUBLE".to_string(),
            FieldType::Decimal {
                max_digits,
                decimal_places,
                ..
            } => format!("DECIMAL({}, {})", max_digits, decimal_places),
            FieldType::Char { max_length } => format!("VARCHAR({})", max_length),
            FieldType::Text => "TEXT".to_string(),
            FieldType::Boolean => "TINYINT(1)".to_string(),
            FieldType::Date => "DATE".to_string(),
            FieldType::Time => "TIME".to_string(),
            FieldType::DateTime { .. } => "DATETIME".to_string(),
            FieldType::Timestamp => "TIMESTAMP".to_string(),
            FieldType::Uuid => "CHAR(36)".to_string(),
            FieldType::Binary => "BLOB".to_string(),
            FieldType::Json | FieldType::Array { .. } => "JSON".to_string(),
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

    fn rename_table(&self, table: &ObjectName, new_name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "RENAME TABLE {} TO {}",
            self.object(table),
            self.quote(new_name)
        ))])
    }

    fn drop_column(
        &self,
        table: &Table,
        column: &str,
        _cascade: bool,
        foreign_key: Option<&str>,
    ) -> MigrateResult<Vec<Statement>> {
        let mut stmts = Vec::new();
        if let Some(name) = foreign_key {
            stmts.extend(self.drop_foreign_key(table, name)?);
        }
        stmts.push(Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.table_ref(table),
            self.quote(column)
        )));
        Ok(stmts)
    }

    fn change_column(
        &self,
        table: &Table,
        field: &Field,
        previous: &Field,
    ) -> MigrateResult<Vec<Statement>> {
        let changed = self.column_type(&field.field_type)
            != self.column_type(&previous.field_type)
            || field.null != previous.null
            || DefaultValue::differs(field.default.as_ref(), previous.default.as_ref());
        if !changed {
            return Ok(Vec::new());
        }
        Ok(vec![self.modify_column(table, field)])
    }

    fn drop_index(&self, table: &ObjectName, name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "DROP INDEX {} ON {}",
            self.quote(name),
            self.object(table)
        ))])
    }

    fn add_not_null(&self, table: &Table, column: &str) -> MigrateResult<Vec<Statement>> {
        let field = self.snapshot_field(table, column)?;
        Ok(vec![self.modify_column(table, field)])
    }

    fn drop_not_null(&self, table: &Table, column: &str) -> MigrateResult<Vec<Statement>> {
        let field = self.snapshot_field(table, column)?;
        Ok(vec![self.modify_column(table, field)])
    }

    fn drop_foreign_key(&self, table: &Table, name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.table_ref(table),
            self.quote(name)
        ))])
    }
}
