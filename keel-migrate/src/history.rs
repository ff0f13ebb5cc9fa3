//! Applied migration history.
//!
//! History lives in a single table (`migratehistory` unless configured
//! otherwise). Row order, which is id order, is application order.

use chrono::{DateTime, NaiveDateTime, Utc};
use keel_schema::{Field, FieldType, Literal, Table};
use tracing::debug;

use crate::context::{ExecutionContext, Row};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{MigrateResult, MigrationError};
use crate::operation::Statement;

/// Default history table name.
pub const DEFAULT_HISTORY_TABLE: &str = "migratehistory";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One applied migration.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Sequence id.
    pub id: i64,
    /// Migration name.
    pub name: String,
    /// When it was applied.
    pub migrated_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn from_row(row: &Row) -> MigrateResult<Self> {
        let id = row
            .get("id")
            .and_then(Literal::as_i64)
            .ok_or_else(|| MigrationError::database("history row without id"))?;
        let name = row
            .get("name")
            .and_then(Literal::as_str)
            .ok_or_else(|| MigrationError::database("history row without name"))?
            .to_string();
        let migrated_at = row
            .get("migrated_at")
            .and_then(Literal::as_str)
            .map(parse_timestamp)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            id,
            name,
            migrated_at,
        })
    }
}

fn parse_timestamp(value: &str) -> MigrateResult<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MigrationError::database(format!("invalid timestamp '{}': {}", value, e)))
}

/// Reads and writes the history table.
#[derive(Debug)]
pub struct HistoryStore {
    table: Table,
    dialect: Box<dyn Dialect>,
}

impl HistoryStore {
    /// Store backed by `table_name` in `schema`.
    pub fn new(table_name: &str, schema: Option<&str>, dialect: DialectKind) -> Self {
        let mut table = Table::new("MigrateHistory", table_name)
            .field(Field::new("id", FieldType::Auto))
            .field(Field::new("name", FieldType::char(255)))
            .field(Field::new("migrated_at", FieldType::datetime()));
        table.schema = schema.map(str::to_string);
        Self {
            table,
            dialect: dialect.build(),
        }
    }

    /// The history table definition.
    pub fn table(&self) -> &Table {
        &self.table
    }

    fn table_ref(&self) -> String {
        self.dialect.table_ref(&self.table)
    }

    fn column(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    /// Create the table if it does not exist.
    pub fn ensure(&self, ctx: &mut dyn ExecutionContext) -> MigrateResult<()> {
        let stmt = self.dialect.create_table_statement(&self.table, true);
        ctx.execute(&stmt)?;
        Ok(())
    }

    /// All entries in application order.
    pub fn entries(&self, ctx: &mut dyn ExecutionContext) -> MigrateResult<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT {}, {}, {} FROM {} ORDER BY {}",
            self.column("id"),
            self.column("name"),
            self.column("migrated_at"),
            self.table_ref(),
            self.column("id")
        );
        ctx.query(&sql, &[])?
            .iter()
            .map(HistoryEntry::from_row)
            .collect()
    }

    /// Applied migration names in application order.
    pub fn names(&self, ctx: &mut dyn ExecutionContext) -> MigrateResult<Vec<String>> {
        Ok(self.entries(ctx)?.into_iter().map(|e| e.name).collect())
    }

    /// Append an entry.
    pub fn record(&self, ctx: &mut dyn ExecutionContext, name: &str) -> MigrateResult<()> {
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let stmt = Statement::with_params(
            format!(
                "INSERT INTO {} ({}, {}) VALUES ({}, {})",
                self.table_ref(),
                self.column("name"),
                self.column("migrated_at"),
                self.dialect.placeholder(1),
                self.dialect.placeholder(2)
            ),
            vec![Literal::from(name), Literal::Text(now)],
        );
        ctx.execute(&stmt)?;
        debug!(migration = %name, "Recorded history entry");
        Ok(())
    }

    /// Delete the entries for `name`.
    pub fn remove(&self, ctx: &mut dyn ExecutionContext, name: &str) -> MigrateResult<()> {
        let stmt = Statement::with_params(
            format!(
                "DELETE FROM {} WHERE {} = {}",
                self.table_ref(),
                self.column("name"),
                self.dialect.placeholder(1)
            ),
            vec![Literal::from(name)],
        );
        ctx.execute(&stmt)?;
        debug!(migration = %name, "Removed history entry");
        Ok(())
    }

    /// Delete every entry.
    pub fn clear(&self, ctx: &mut dyn ExecutionContext) -> MigrateResult<()> {
        ctx.execute(&Statement::new(format!("DELETE FROM {}", self.table_ref())))?;
        Ok(())
    }
}
