//! Dialect lowering of queued operations.
//!
//! [`Dialect`] provides ANSI defaults for every operation; engine dialects
//! override only what their syntax requires.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use keel_schema::naming::make_index_name;
use keel_schema::{DefaultValue, Field, FieldType, Literal, PrimaryKey, Table};
use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};
use crate::operation::{ForeignKeyConstraint, ObjectName, Operation, Statement};

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Supported dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// ANSI SQL.
    #[default]
    Generic,
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    MySql,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Build the dialect.
    pub fn build(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect),
            Self::Postgres => Box::new(PostgresDialect),
            Self::MySql => Box::new(MySqlDialect),
            Self::Sqlite => Box::new(SqliteDialect),
        }
    }

    /// Dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(MigrationError::config(format!("unknown dialect '{}'", other))),
        }
    }
}

/// How a column definition is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMode {
    /// Inside `CREATE TABLE`.
    Create,
    /// In `ADD COLUMN`: always nullable, no key.
    Add,
    /// In a full column redefinition: honours nullability, no key.
    Modify,
}

/// Translates logical operations into native statements.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Which dialect this is.
    fn kind(&self) -> DialectKind;

    /// Quote an identifier.
    fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Render a possibly schema-qualified name.
    fn object(&self, name: &ObjectName) -> String {
        match &name.schema {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&name.name)),
            None => self.quote(&name.name),
        }
    }

    /// Render the name of a table snapshot.
    fn table_ref(&self, table: &Table) -> String {
        self.object(&ObjectName::of(table))
    }

    /// Whether foreign keys live in the table definition and follow table
    /// and column renames without being recreated.
    fn inline_foreign_keys(&self) -> bool {
        false
    }

    /// Positional parameter placeholder (1-based).
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Native column type.
    fn column_type(&self, field_type: &FieldType) -> String {
        ansi_column_type(self, field_type)
    }

    /// Render a literal.
    fn literal(&self, value: &Literal) -> String {
        match value {
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            other => other.to_string(),
        }
    }

    /// Render a default, or `None` for computed defaults.
    fn default_value(&self, default: &DefaultValue) -> Option<String> {
        match default {
            DefaultValue::Value(value) => Some(self.literal(value)),
            DefaultValue::Expression(sql) => Some(sql.clone()),
            DefaultValue::Computed => None,
        }
    }

    /// Render a column definition.
    fn column_definition(&self, table: &Table, field: &Field, mode: ColumnMode) -> String {
        ansi_column_definition(self, table, field, mode)
    }

    /// `CREATE TABLE` statement, without indexes.
    fn create_table_statement(&self, table: &Table, safe: bool) -> Statement {
        let mut columns: Vec<String> = table
            .fields
            .iter()
            .map(|f| self.column_definition(table, f, ColumnMode::Create))
            .collect();

        if let Some(pk) = self.primary_key_clause(table) {
            columns.push(pk);
        }

        for field in table.foreign_keys() {
            if let Some(fk) = ForeignKeyConstraint::for_field(table, field) {
                columns.push(self.foreign_key_clause(&fk));
            }
        }

        for constraint in &table.constraints {
            columns.push(format!(
                "CONSTRAINT {} {}",
                self.quote(&constraint.name),
                constraint.definition
            ));
        }

        Statement::new(format!(
            "CREATE TABLE {}{} (\n    {}\n)",
            if safe { "IF NOT EXISTS " } else { "" },
            self.table_ref(table),
            columns.join(",\n    ")
        ))
    }

    /// Table-level primary key clause.
    fn primary_key_clause(&self, table: &Table) -> Option<String> {
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

    /// `CONSTRAINT .. FOREIGN KEY ..` clause.
    fn foreign_key_clause(&self, fk: &ForeignKeyConstraint) -> String {
        let mut clause = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote(&fk.name),
            self.quote(&fk.column),
            self.object(&fk.target),
            self.quote(&fk.target_column)
        );
        if let Some(policy) = &fk.on_delete {
            clause.push_str(&format!(" ON DELETE {}", policy.to_ascii_uppercase()));
        }
        if let Some(policy) = &fk.on_update {
            clause.push_str(&format!(" ON UPDATE {}", policy.to_ascii_uppercase()));
        }
        clause
    }

    /// Index statements for every index of a snapshot.
    fn index_statements(&self, table: &Table) -> Vec<Statement> {
        let name = ObjectName::of(table);
        table_indexes(table)
            .into_iter()
            .map(|(index, columns, unique)| self.add_index(&name, &index, &columns, unique))
            .collect()
    }

    /// Create a table and its indexes.
    fn create_table(&self, table: &Table) -> MigrateResult<Vec<Statement>> {
        let mut stmts = vec![self.create_table_statement(table, false)];
        stmts.extend(self.index_statements(table));
        Ok(stmts)
    }

    /// Drop a table.
    fn drop_table(&self, table: &ObjectName, cascade: bool) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "DROP TABLE IF EXISTS {}{}",
            self.object(table),
            if cascade { " CASCADE" } else { "" }
        ))])
    }

    /// Rename a table.
    fn rename_table(&self, table: &ObjectName, new_name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.object(table),
            self.quote(new_name)
        ))])
    }

    /// Add a column as nullable.
    fn add_column(&self, table: &Table, field: &Field) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table_ref(table),
            self.column_definition(table, field, ColumnMode::Add)
        ))])
    }

    /// Drop a column.
    fn drop_column(
        &self,
        table: &Table,
        column: &str,
        cascade: bool,
        _foreign_key: Option<&str>,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {}{}",
            self.table_ref(table),
            self.quote(column),
            if cascade { " CASCADE" } else { "" }
        ))])
    }

    /// `ALTER COLUMN` clause changing the type.
    fn alter_type_clause(&self, column: &str, column_type: &str) -> String {
        format!(
            "ALTER COLUMN {} SET DATA TYPE {}",
            self.quote(column),
            column_type
        )
    }

    /// Change type, default and nullability of a column.
    fn change_column(
        &self,
        table: &Table,
        field: &Field,
        previous: &Field,
    ) -> MigrateResult<Vec<Statement>> {
        let table_ref = self.table_ref(table);
        let column = field.column();
        let mut stmts = Vec::new();

        let new_type = self.column_type(&field.field_type);
        if new_type != self.column_type(&previous.field_type) {
            stmts.push(Statement::new(format!(
                "ALTER TABLE {} {}",
                table_ref,
                self.alter_type_clause(&column, &new_type)
            )));
        }

        if DefaultValue::differs(field.default.as_ref(), previous.default.as_ref()) {
            match field.default.as_ref().and_then(|d| self.default_value(d)) {
                Some(default) => stmts.push(Statement::new(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                    table_ref,
                    self.quote(&column),
                    default
                ))),
                None => stmts.push(Statement::new(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                    table_ref,
                    self.quote(&column)
                ))),
            }
        }

        if field.null != previous.null {
            let action = if field.null { "DROP NOT NULL" } else { "SET NOT NULL" };
            stmts.push(Statement::new(format!(
                "ALTER TABLE {} ALTER COLUMN {} {}",
                table_ref,
                self.quote(&column),
                action
            )));
        }

        Ok(stmts)
    }

    /// Rename a column.
    fn rename_column(
        &self,
        table: &ObjectName,
        old: &str,
        new: &str,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.object(table),
            self.quote(old),
            self.quote(new)
        ))])
    }

    /// Create an index.
    fn add_index(
        &self,
        table: &ObjectName,
        name: &str,
        columns: &[String],
        unique: bool,
    ) -> Statement {
        let cols: Vec<String> = columns.iter().map(|c| self.quote(c)).collect();
        Statement::new(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote(name),
            self.object(table),
            cols.join(", ")
        ))
    }

    /// Drop an index.
    fn drop_index(&self, table: &ObjectName, name: &str) -> MigrateResult<Vec<Statement>> {
        let index = ObjectName {
            schema: table.schema.clone(),
            name: name.to_string(),
        };
        Ok(vec![Statement::new(format!("DROP INDEX {}", self.object(&index)))])
    }

    /// Add a NOT NULL constraint.
    fn add_not_null(&self, table: &Table, column: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
            self.table_ref(table),
            self.quote(column)
        ))])
    }

    /// Drop a NOT NULL constraint.
    fn drop_not_null(&self, table: &Table, column: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
            self.table_ref(table),
            self.quote(column)
        ))])
    }

    /// Set a column default.
    fn set_default(
        &self,
        table: &Table,
        column: &str,
        default: &DefaultValue,
    ) -> MigrateResult<Vec<Statement>> {
        let Some(value) = self.default_value(default) else {
            return Ok(Vec::new());
        };
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
            self.table_ref(table),
            self.quote(column),
            value
        ))])
    }

    /// Add a foreign key constraint.
    fn add_foreign_key(
        &self,
        table: &Table,
        constraint: &ForeignKeyConstraint,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ADD {}",
            self.table_ref(table),
            self.foreign_key_clause(constraint)
        ))])
    }

    /// Drop a foreign key constraint.
    fn drop_foreign_key(&self, table: &Table, name: &str) -> MigrateResult<Vec<Statement>> {
        self.drop_constraint(table, name)
    }

    /// Add a named constraint.
    fn add_constraint(
        &self,
        table: &Table,
        name: &str,
        definition: &str,
    ) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {}",
            self.table_ref(table),
            self.quote(name),
            definition
        ))])
    }

    /// Drop a named constraint.
    fn drop_constraint(&self, table: &Table, name: &str) -> MigrateResult<Vec<Statement>> {
        Ok(vec![Statement::new(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table_ref(table),
            self.quote(name)
        ))])
    }

    /// Lower one operation. Callbacks lower to nothing; the migrator runs them.
    fn lower(&self, op: &Operation) -> MigrateResult<Vec<Statement>> {
        match op {
            Operation::RawSql(stmt) => Ok(vec![stmt.clone()]),
            Operation::CreateTable { table } => self.create_table(table),
            Operation::DropTable { table, cascade } => self.drop_table(table, *cascade),
            Operation::RenameTable { table, new_name } => self.rename_table(table, new_name),
            Operation::AddColumn { table, field } => self.add_column(table, field),
            Operation::DropColumn {
                table,
                column,
                cascade,
                foreign_key,
            } => self.drop_column(table, column, *cascade, foreign_key.as_deref()),
            Operation::ChangeColumn {
                table,
                field,
                previous,
            } => self.change_column(table, field, previous),
            Operation::RenameColumn { table, old, new } => self.rename_column(table, old, new),
            Operation::AddIndex {
                table,
                name,
                columns,
                unique,
            } => Ok(vec![self.add_index(table, name, columns, *unique)]),
            Operation::DropIndex { table, name } => self.drop_index(table, name),
            Operation::AddNotNull { table, column } => self.add_not_null(table, column),
            Operation::DropNotNull { table, column } => self.drop_not_null(table, column),
            Operation::SetDefault {
                table,
                column,
                default,
            } => self.set_default(table, column, default),
            Operation::AddForeignKeyConstraint { table, constraint } => {
                self.add_foreign_key(table, constraint)
            }
            Operation::DropForeignKeyConstraint { table, name } => {
                self.drop_foreign_key(table, name)
            }
            Operation::AddConstraint {
                table,
                name,
                definition,
            } => self.add_constraint(table, name, definition),
            Operation::DropConstraint { table, name } => self.drop_constraint(table, name),
            Operation::RunCallback(_) => Ok(Vec::new()),
        }
    }
}

/// ANSI type mapping. Array element types go back through the dialect.
pub fn ansi_column_type<D: Dialect + ?Sized>(dialect: &D, field_type: &FieldType) -> String {
    match field_type {
        FieldType::Auto | FieldType::Integer => "INTEGER".to_string(),
        FieldType::BigAuto | FieldType::BigInteger => "BIGINT".to_string(),
        FieldType::SmallInteger => "SMALLINT".to_string(),
        FieldType::Float => "REAL".to_string(),
        FieldType::Double => "DOUBLE PRECISION".to_string(),
        FieldType::Decimal {
            max_digits,
            decimal_places,
            ..
        } => format!("NUMERIC({}, {})", max_digits, decimal_places),
        FieldType::Char { max_length } => format!("VARCHAR({})", max_length),
        FieldType::Text | FieldType::Json => "TEXT".to_string(),
        FieldType::Boolean => "BOOLEAN".to_string(),
        FieldType::Date => "DATE".to_string(),
        FieldType::Time => "TIME".to_string(),
        FieldType::DateTime { .. } => "TIMESTAMP".to_string(),
        FieldType::Timestamp => "TIMESTAMP WITH TIME ZONE".to_string(),
        FieldType::Uuid => "CHAR(36)".to_string(),
        FieldType::Binary => "BLOB".to_string(),
        FieldType::Array { inner, dimensions } => {
            let mut ty = dialect.column_type(inner);
            for _ in 0..*dimensions {
                ty.push_str(" ARRAY");
            }
            ty
        }
        FieldType::ForeignKey(_) => dialect.column_type(&foreign_column_type(field_type)),
    }
}

/// `"name" TYPE [NOT NULL] [DEFAULT ..]`.
pub fn ansi_column_definition<D: Dialect + ?Sized>(
    dialect: &D,
    _table: &Table,
    field: &Field,
    mode: ColumnMode,
) -> String {
    let mut parts = vec![
        dialect.quote(&field.column()),
        dialect.column_type(&field.field_type),
    ];

    let nullable = field.null || mode == ColumnMode::Add;
    if !nullable {
        parts.push("NOT NULL".to_string());
    }

    if let Some(default) = field.default.as_ref().and_then(|d| dialect.default_value(d)) {
        parts.push(format!("DEFAULT {}", default));
    }

    parts.join(" ")
}

/// Column type of a foreign key: the referenced column's type, with
/// auto-increment types reduced to plain integers.
pub fn foreign_column_type(field_type: &FieldType) -> FieldType {
    let Some(fk) = field_type.as_foreign_key() else {
        return field_type.clone();
    };
    match fk.target.as_ref().map(|t| t.field_type.as_ref()) {
        Some(FieldType::Auto) | None => FieldType::Integer,
        Some(FieldType::BigAuto) => FieldType::BigInteger,
        Some(FieldType::ForeignKey(_)) => FieldType::Integer,
        Some(other) => other.clone(),
    }
}

/// Every index of a snapshot as `(name, columns, unique)`, single-column
/// indexes first.
pub fn table_indexes(table: &Table) -> Vec<(String, Vec<String>, bool)> {
    let mut indexes = Vec::new();

    for field in table.fields.iter().filter(|f| f.indexed()) {
        let column = field.column();
        indexes.push((
            make_index_name(&table.table_name, &[&column]),
            vec![column],
            field.unique,
        ));
    }

    for index in &table.indexes {
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|name| {
                table
                    .get_field(name)
                    .map(Field::column)
                    .unwrap_or_else(|| name.clone())
            })
            .collect();
        indexes.push((
            make_index_name(&table.table_name, &columns),
            columns,
            index.unique,
        ));
    }

    indexes
}

/// Whether a single-field primary key is also an auto-increment field.
pub(crate) fn auto_primary_key<'a>(table: &'a Table) -> Option<&'a Field> {
    match &table.primary_key {
        PrimaryKey::Field(name) => table
            .get_field(name)
            .filter(|f| f.field_type.is_auto()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_schema::{ForeignKey, ForeignTarget, Index};

    fn person() -> Table {
        Table::new("Person", "person")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::new("name", FieldType::char(100)))
            .field(Field::new("email", FieldType::char(255)).unique(true))
            .index(Index::new(["name", "email"]))
    }

    #[test]
    fn test_dialect_kind_from_str() {
        assert_eq!("postgresql".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("SQLite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!(matches!(
            "oracle".parse::<DialectKind>(),
            Err(MigrationError::Config(_))
        ));
    }

    #[test]
    fn test_generic_create_table() {
        let stmts = GenericDialect.create_table(&person()).unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].sql.starts_with("CREATE TABLE \"person\""));
        assert!(stmts[0].sql.contains("\"name\" VARCHAR(100) NOT NULL"));
        assert!(stmts[0].sql.contains("PRIMARY KEY (\"id\")"));
        assert_eq!(
            stmts[1].sql,
            "CREATE UNIQUE INDEX \"person_email\" ON \"person\" (\"email\")"
        );
        assert_eq!(
            stmts[2].sql,
            "CREATE INDEX \"person_name_email\" ON \"person\" (\"name\", \"email\")"
        );
    }

    #[test]
    fn test_generic_add_column_is_nullable() {
        let table = person();
        let field = Field::new("age", FieldType::Integer).default(DefaultValue::value(0i64));
        let stmts = GenericDialect.add_column(&table, &field).unwrap();
        assert_eq!(
            stmts[0].sql,
            "ALTER TABLE \"person\" ADD COLUMN \"age\" INTEGER DEFAULT 0"
        );
    }

    #[test]
    fn test_generic_change_column() {
        let table = person();
        let previous = Field::new("name", FieldType::char(100));
        let field = Field::new("name", FieldType::Text).null(true);
        let stmts = GenericDialect.change_column(&table, &field, &previous).unwrap();
        let sql: Vec<&str> = stmts.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE \"person\" ALTER COLUMN \"name\" SET DATA TYPE TEXT",
                "ALTER TABLE \"person\" ALTER COLUMN \"name\" DROP NOT NULL",
            ]
        );
    }

    #[test]
    fn test_foreign_key_column_type_follows_target() {
        let mut fk = ForeignKey::new("person");
        assert_eq!(
            foreign_column_type(&FieldType::ForeignKey(fk.clone())),
            FieldType::Integer
        );

        fk.target = Some(ForeignTarget {
            table: "person".into(),
            column: "id".into(),
            field_type: Box::new(FieldType::BigAuto),
        });
        assert_eq!(
            foreign_column_type(&FieldType::ForeignKey(fk)),
            FieldType::BigInteger
        );
    }

    #[test]
    fn test_create_table_with_foreign_key() {
        let pet = Table::new("Pet", "pet")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::foreign_key(
                "owner",
                ForeignKey::new("person").on_delete("cascade"),
            ));
        let stmts = GenericDialect.create_table(&pet).unwrap();
        assert!(stmts[0].sql.contains(
            "CONSTRAINT \"fk_pet_owner_id_refs_person\" FOREIGN KEY (\"owner_id\") \
             REFERENCES \"person\" (\"id\") ON DELETE CASCADE"
        ));
    }

    #[test]
    fn test_lower_callback_is_empty() {
        let op = Operation::RunCallback(crate::operation::Callback {
            label: "noop".into(),
            func: std::sync::Arc::new(|_| Ok(())),
        });
        assert!(GenericDialect.lower(&op).unwrap().is_empty());
    }
}
