//! SQLite execution context.

use std::path::Path;

use keel_schema::Literal;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, trace};

use crate::context::{ExecutionContext, Row};
use crate::error::MigrateResult;
use crate::operation::Statement;

/// Executes statements on a single SQLite connection.
#[derive(Debug)]
pub struct SqliteContext {
    conn: Connection,
}

impl SqliteContext {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> MigrateResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening SQLite database");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> MigrateResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Unwrap into the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

fn to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(b) => Value::Integer(i64::from(*b)),
        Literal::Int(i) => Value::Integer(*i),
        Literal::Float(f) => Value::Real(*f),
        Literal::Text(s) => Value::Text(s.clone()),
        Literal::Null => Value::Null,
    }
}

fn from_value(value: ValueRef<'_>) -> Literal {
    match value {
        ValueRef::Null => Literal::Null,
        ValueRef::Integer(i) => Literal::Int(i),
        ValueRef::Real(f) => Literal::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Literal::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl ExecutionContext for SqliteContext {
    fn execute(&mut self, statement: &Statement) -> MigrateResult<usize> {
        trace!(sql = %statement.sql, params = statement.params.len(), "sqlite execute");
        if statement.params.is_empty() {
            self.conn.execute_batch(&statement.sql)?;
            return Ok(self.conn.changes() as usize);
        }
        let params = params_from_iter(statement.params.iter().map(to_value));
        Ok(self.conn.execute(&statement.sql, params)?)
    }

    fn query(&mut self, sql: &str, params: &[Literal]) -> MigrateResult<Vec<Row>> {
        trace!(sql = %sql, "sqlite query");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_value)))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, column) in columns.iter().enumerate() {
                record.insert(column.clone(), from_value(row.get_ref(i)?));
            }
            result.push(record);
        }
        Ok(result)
    }

    fn begin(&mut self) -> MigrateResult<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> MigrateResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> MigrateResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
