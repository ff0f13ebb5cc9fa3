//! Queued schema operations.
//!
//! Operations are produced by the [`Migrator`](crate::Migrator) and lowered
//! to native statements by a [`Dialect`](crate::dialect::Dialect) when the
//! queue is flushed. Operations that an engine may have to implement by
//! rebuilding the table carry the post-change table snapshot.

use std::fmt;
use std::sync::Arc;

use keel_schema::naming::foreign_key_name;
use keel_schema::{DefaultValue, Field, Literal, Table};

use crate::context::ExecutionContext;
use crate::error::MigrateResult;

/// A native statement with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<Literal>,
}

impl Statement {
    /// A statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Literal>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    /// Schema namespace.
    pub schema: Option<String>,
    /// Object name.
    pub name: String,
}

impl ObjectName {
    /// Create an unqualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Name of a table snapshot.
    pub fn of(table: &Table) -> Self {
        Self {
            schema: table.schema.clone(),
            name: table.table_name.clone(),
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Callback queued with [`Migrator::run`](crate::Migrator::run).
pub type CallbackFn = dyn Fn(&mut dyn ExecutionContext) -> MigrateResult<()> + Send + Sync;

/// A labelled callback.
#[derive(Clone)]
pub struct Callback {
    /// Label used in logs.
    pub label: String,
    /// The function to run.
    pub func: Arc<CallbackFn>,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Foreign key constraint details.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyConstraint {
    /// Constraint name.
    pub name: String,
    /// Referencing column.
    pub column: String,
    /// Referenced table.
    pub target: ObjectName,
    /// Referenced column.
    pub target_column: String,
    /// `ON DELETE` policy.
    pub on_delete: Option<String>,
    /// `ON UPDATE` policy.
    pub on_update: Option<String>,
}

impl ForeignKeyConstraint {
    /// Constraint for a foreign key field of `table`, if the field is one.
    pub fn for_field(table: &Table, field: &Field) -> Option<Self> {
        let fk = field.foreign_key_ref()?;
        let column = field.column();
        let (target_table, target_column) = match &fk.target {
            Some(target) => (target.table.clone(), target.column.clone()),
            None => (
                fk.target_table(&table.table_name).to_string(),
                fk.field.clone(),
            ),
        };
        Some(Self {
            name: foreign_key_name(&table.table_name, &column, &target_table),
            column,
            target: ObjectName {
                schema: table.schema.clone(),
                name: target_table,
            },
            target_column,
            on_delete: fk.on_delete.clone(),
            on_update: fk.on_update.clone(),
        })
    }
}

/// A queued schema operation.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Verbatim statement.
    RawSql(Statement),
    /// Create a table with its indexes.
    CreateTable {
        /// Table to create.
        table: Arc<Table>,
    },
    /// Drop a table.
    DropTable {
        /// Table to drop.
        table: ObjectName,
        /// Drop dependent objects.
        cascade: bool,
    },
    /// Rename a table.
    RenameTable {
        /// Current name.
        table: ObjectName,
        /// New table name.
        new_name: String,
    },
    /// Add a column. The column is added as nullable; NOT NULL, foreign key
    /// and index are separate operations.
    AddColumn {
        /// Snapshot including the new field.
        table: Arc<Table>,
        /// The new field.
        field: Field,
    },
    /// Drop a column.
    DropColumn {
        /// Snapshot without the column.
        table: Arc<Table>,
        /// Column to drop.
        column: String,
        /// Drop dependent objects.
        cascade: bool,
        /// Foreign key constraint on the column, if any.
        foreign_key: Option<String>,
    },
    /// Change the type, nullability or default of a column.
    ChangeColumn {
        /// Snapshot including the changed field.
        table: Arc<Table>,
        /// New definition.
        field: Field,
        /// Previous definition.
        previous: Field,
    },
    /// Rename a column.
    RenameColumn {
        /// Table owning the column.
        table: ObjectName,
        /// Current column name.
        old: String,
        /// New column name.
        new: String,
    },
    /// Create an index.
    AddIndex {
        /// Indexed table.
        table: ObjectName,
        /// Index name.
        name: String,
        /// Indexed columns.
        columns: Vec<String>,
        /// Unique index.
        unique: bool,
    },
    /// Drop an index.
    DropIndex {
        /// Indexed table.
        table: ObjectName,
        /// Index name.
        name: String,
    },
    /// Add a NOT NULL constraint.
    AddNotNull {
        /// Snapshot with the column NOT NULL.
        table: Arc<Table>,
        /// Column.
        column: String,
    },
    /// Drop a NOT NULL constraint.
    DropNotNull {
        /// Snapshot with the column nullable.
        table: Arc<Table>,
        /// Column.
        column: String,
    },
    /// Set a column default.
    SetDefault {
        /// Snapshot with the new default.
        table: Arc<Table>,
        /// Column.
        column: String,
        /// Default value.
        default: DefaultValue,
    },
    /// Add a foreign key constraint.
    AddForeignKeyConstraint {
        /// Snapshot including the constraint.
        table: Arc<Table>,
        /// Constraint details.
        constraint: ForeignKeyConstraint,
    },
    /// Drop a foreign key constraint.
    DropForeignKeyConstraint {
        /// Snapshot without the constraint.
        table: Arc<Table>,
        /// Constraint name.
        name: String,
    },
    /// Add a named table constraint.
    AddConstraint {
        /// Snapshot including the constraint.
        table: Arc<Table>,
        /// Constraint name.
        name: String,
        /// Constraint definition.
        definition: String,
    },
    /// Drop a named table constraint.
    DropConstraint {
        /// Snapshot without the constraint.
        table: Arc<Table>,
        /// Constraint name.
        name: String,
    },
    /// Run a callback against the execution context.
    RunCallback(Callback),
}

impl Operation {
    /// Short kind name, used in logs and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RawSql(_) => "raw_sql",
            Self::CreateTable { .. } => "create_table",
            Self::DropTable { .. } => "drop_table",
            Self::RenameTable { .. } => "rename_table",
            Self::AddColumn { .. } => "add_column",
            Self::DropColumn { .. } => "drop_column",
            Self::ChangeColumn { .. } => "change_column",
            Self::RenameColumn { .. } => "rename_column",
            Self::AddIndex { .. } => "add_index",
            Self::DropIndex { .. } => "drop_index",
            Self::AddNotNull { .. } => "add_not_null",
            Self::DropNotNull { .. } => "drop_not_null",
            Self::SetDefault { .. } => "set_default",
            Self::AddForeignKeyConstraint { .. } => "add_foreign_key_constraint",
            Self::DropForeignKeyConstraint { .. } => "drop_foreign_key_constraint",
            Self::AddConstraint { .. } => "add_constraint",
            Self::DropConstraint { .. } => "drop_constraint",
            Self::RunCallback(_) => "run_callback",
        }
    }
}
