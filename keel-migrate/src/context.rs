//! Execution contexts.
//!
//! Migration procedures and the router talk to the database only through
//! [`ExecutionContext`]. Fake runs get a [`NoopContext`], which records what
//! would have been executed and answers every query with an empty result.

use indexmap::IndexMap;
use keel_schema::Literal;
use tracing::trace;

use crate::error::MigrateResult;
use crate::operation::Statement;

/// A result row, keyed by column name.
pub type Row = IndexMap<String, Literal>;

/// Capability to execute statements against a database.
pub trait ExecutionContext {
    /// Execute a statement, returning the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> MigrateResult<usize>;

    /// Run a query and collect its rows.
    fn query(&mut self, sql: &str, params: &[Literal]) -> MigrateResult<Vec<Row>>;

    /// Begin a transaction.
    fn begin(&mut self) -> MigrateResult<()>;

    /// Commit the current transaction.
    fn commit(&mut self) -> MigrateResult<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> MigrateResult<()>;

    /// Whether statements are suppressed.
    fn is_fake(&self) -> bool {
        false
    }
}

/// Context that executes nothing.
#[derive(Debug, Default)]
pub struct NoopContext {
    statements: Vec<Statement>,
}

impl NoopContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements and queries that would have been executed.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Take the recorded statements.
    pub fn take(&mut self) -> Vec<Statement> {
        std::mem::take(&mut self.statements)
    }
}

impl ExecutionContext for NoopContext {
    fn execute(&mut self, statement: &Statement) -> MigrateResult<usize> {
        trace!(sql = %statement.sql, "Suppressed statement");
        self.statements.push(statement.clone());
        Ok(0)
    }

    fn query(&mut self, sql: &str, params: &[Literal]) -> MigrateResult<Vec<Row>> {
        trace!(sql = %sql, "Suppressed query");
        self.statements
            .push(Statement::with_params(sql, params.to_vec()));
        Ok(Vec::new())
    }

    fn begin(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    fn rollback(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    fn is_fake(&self) -> bool {
        true
    }
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for &mut C {
    fn execute(&mut self, statement: &Statement) -> MigrateResult<usize> {
        (**self).execute(statement)
    }

    fn query(&mut self, sql: &str, params: &[Literal]) -> MigrateResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn begin(&mut self) -> MigrateResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> MigrateResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> MigrateResult<()> {
        (**self).rollback()
    }

    fn is_fake(&self) -> bool {
        (**self).is_fake()
    }
}
