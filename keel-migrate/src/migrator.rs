//! The schema mutator.
//!
//! Every method resolves its table, replaces the registry snapshot and
//! queues the operations needed to bring the database along. Nothing is
//! executed until [`Migrator::flush`].

use std::collections::BTreeSet;
use std::sync::Arc;

use keel_schema::naming::make_index_name;
use keel_schema::{
    Constraint, DefaultValue, Field, Index, Literal, PrimaryKey, SchemaError, Table,
};
use tracing::{debug, trace};

use crate::context::ExecutionContext;
use crate::dialect::{Dialect, DialectKind};
use crate::error::{MigrateResult, MigrationError};
use crate::operation::{Callback, ForeignKeyConstraint, ObjectName, Operation, Statement};
use crate::orm::Orm;

/// Anything that names a registered table.
pub trait TableRef {
    /// Table name or model name to look up.
    fn key(&self) -> &str;
}

impl TableRef for str {
    fn key(&self) -> &str {
        self
    }
}

impl TableRef for String {
    fn key(&self) -> &str {
        self
    }
}

impl TableRef for Table {
    fn key(&self) -> &str {
        &self.table_name
    }
}

impl TableRef for Arc<Table> {
    fn key(&self) -> &str {
        &self.table_name
    }
}

impl<T: TableRef + ?Sized> TableRef for &T {
    fn key(&self) -> &str {
        (**self).key()
    }
}

/// Registry plus pending operation queue.
#[derive(Debug)]
pub struct Migrator {
    dialect: Box<dyn Dialect>,
    orm: Orm,
    ops: Vec<Operation>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(DialectKind::default())
    }
}

impl Migrator {
    /// Create a migrator with an empty registry.
    pub fn new(dialect: DialectKind) -> Self {
        Self::with_dialect(dialect.build())
    }

    /// Create a migrator around an existing dialect.
    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self {
            dialect,
            orm: Orm::new(),
            ops: Vec::new(),
        }
    }

    /// The lowering dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// The registry.
    pub fn orm(&self) -> &Orm {
        &self.orm
    }

    /// Current snapshot of a table.
    pub fn table(&self, table: impl TableRef) -> MigrateResult<Arc<Table>> {
        self.orm.require(table.key())
    }

    /// All current snapshots.
    pub fn tables(&self) -> Vec<Arc<Table>> {
        self.orm.tables()
    }

    /// Pending operations.
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Lower the pending queue without executing or clearing it.
    pub fn statements(&self) -> MigrateResult<Vec<Statement>> {
        let mut stmts = Vec::new();
        for op in &self.ops {
            stmts.extend(self.dialect.lower(op)?);
        }
        Ok(stmts)
    }

    /// Copy of the registry, for [`restore`](Self::restore).
    pub fn checkpoint(&self) -> Orm {
        self.orm.clone()
    }

    /// Reset the registry to a checkpoint.
    pub fn restore(&mut self, orm: Orm) {
        self.orm = orm;
    }

    /// Drop all pending operations.
    pub fn discard(&mut self) {
        if !self.ops.is_empty() {
            trace!(count = self.ops.len(), "Discarding queued operations");
        }
        self.ops.clear();
    }

    /// Run `f` keeping its registry changes but discarding what it queues.
    pub fn fake<R>(&mut self, f: impl FnOnce(&mut Self) -> MigrateResult<R>) -> MigrateResult<R> {
        let mark = self.ops.len();
        let result = f(self);
        self.ops.truncate(mark);
        result
    }

    /// Execute the queue in order against `ctx`.
    ///
    /// The queue is empty afterwards whether or not execution succeeded.
    pub fn flush(&mut self, ctx: &mut dyn ExecutionContext) -> MigrateResult<()> {
        let ops = std::mem::take(&mut self.ops);
        for op in &ops {
            if let Operation::RunCallback(callback) = op {
                debug!(callback = %callback.label, "Running callback");
                (callback.func)(&mut *ctx)?;
                continue;
            }
            for stmt in self.dialect.lower(op)? {
                debug!(sql = %stmt.sql, "Executing statement");
                ctx.execute(&stmt)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, op: Operation) {
        trace!(op = op.kind(), "Queued operation");
        self.ops.push(op);
    }

    fn working_copy(&self, table: &impl TableRef) -> MigrateResult<Table> {
        Ok((*self.orm.require(table.key())?).clone())
    }

    fn commit(&mut self, table: Table) -> Arc<Table> {
        self.orm.insert(table)
    }

    /// Create a table and register it.
    pub fn create_table(&mut self, mut table: Table) -> MigrateResult<Arc<Table>> {
        table.normalize();
        table.validate()?;
        if self.orm.contains(&table.table_name) || self.orm.contains(&table.name) {
            return Err(SchemaError::duplicate("table", &table.table_name).into());
        }
        let snapshot = self.commit(table);
        self.push(Operation::CreateTable {
            table: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Drop a table and unregister it.
    pub fn remove_table(&mut self, table: impl TableRef, cascade: bool) -> MigrateResult<()> {
        let current = self.orm.require(table.key())?;
        self.orm.remove(&current.name);
        self.push(Operation::DropTable {
            table: ObjectName::of(&current),
            cascade,
        });
        Ok(())
    }

    /// Add fields to a table.
    ///
    /// Columns are added nullable; NOT NULL, foreign key constraints and
    /// indexes follow as separate operations.
    pub fn add_fields(
        &mut self,
        table: impl TableRef,
        fields: impl IntoIterator<Item = Field>,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let mut snapshot = self.orm.require(table.key())?;

        for field in fields {
            if working.has_field(&field.name) {
                return Err(SchemaError::duplicate("field", &field.name).into());
            }
            if working.primary_key.is_none() && field.field_type.is_auto() {
                working.primary_key = PrimaryKey::Field(field.name.clone());
            }
            let name = field.name.clone();
            working.fields.push(field);
            snapshot = self.commit(working.clone());

            let field = snapshot.require_field(&name)?.clone();
            let column = field.column();
            self.push(Operation::AddColumn {
                table: snapshot.clone(),
                field: field.clone(),
            });
            if !field.null {
                self.push(Operation::AddNotNull {
                    table: snapshot.clone(),
                    column: column.clone(),
                });
            }
            if let Some(constraint) = ForeignKeyConstraint::for_field(&snapshot, &field) {
                self.push(Operation::AddForeignKeyConstraint {
                    table: snapshot.clone(),
                    constraint,
                });
            }
            if field.indexed() {
                self.push(single_index(&snapshot, &column, field.unique));
            }
        }

        Ok(snapshot)
    }

    /// Replace field definitions.
    pub fn change_fields(
        &mut self,
        table: impl TableRef,
        fields: impl IntoIterator<Item = Field>,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let mut snapshot = self.orm.require(table.key())?;

        for field in fields {
            let previous = require_field(&working, &field.name)?.clone();
            let old_column = previous.column();
            let new_column = field.column();
            let renamed = old_column != new_column;
            let reindex = renamed
                || previous.indexed() != field.indexed()
                || previous.unique != field.unique;

            if reindex && previous.indexed() {
                self.push(drop_single_index(&working, &old_column));
            }
            let composites = if renamed {
                self.drop_composites(&working, &field.name)
            } else {
                Vec::new()
            };
            let old_fk = ForeignKeyConstraint::for_field(&working, &previous);

            working.replace_field(field.clone());
            snapshot = self.commit(working.clone());
            let field = snapshot.require_field(&field.name)?.clone();

            if renamed {
                self.push(Operation::RenameColumn {
                    table: ObjectName::of(&snapshot),
                    old: old_column,
                    new: new_column.clone(),
                });
            }
            if let Some(old_fk) = old_fk {
                self.push(Operation::DropForeignKeyConstraint {
                    table: snapshot.clone(),
                    name: old_fk.name,
                });
            }

            let needs_change = previous.field_type != field.field_type
                || previous.null != field.null
                || DefaultValue::differs(previous.default.as_ref(), field.default.as_ref());
            if needs_change {
                self.push(Operation::ChangeColumn {
                    table: snapshot.clone(),
                    field: field.clone(),
                    previous: previous.clone(),
                });
            }
            if let Some(constraint) = ForeignKeyConstraint::for_field(&snapshot, &field) {
                self.push(Operation::AddForeignKeyConstraint {
                    table: snapshot.clone(),
                    constraint,
                });
            }

            if reindex && field.indexed() {
                self.push(single_index(&snapshot, &new_column, field.unique));
            }
            for index in composites {
                self.push(composite_index(&snapshot, &index));
            }
        }

        Ok(snapshot)
    }

    /// Remove fields from a table.
    pub fn remove_fields<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        names: impl IntoIterator<Item = S>,
        cascade: bool,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let mut snapshot = self.orm.require(table.key())?;

        for name in names {
            let name = name.as_ref();
            let field = require_field(&working, name)?.clone();
            let column = field.column();

            if field.indexed() {
                self.push(drop_single_index(&working, &column));
            }
            self.drop_composites(&working, name);
            working.indexes.retain(|idx| !idx.columns.iter().any(|c| c == name));

            let foreign_key = ForeignKeyConstraint::for_field(&working, &field).map(|fk| fk.name);
            working.primary_key.remove(name);
            working.remove_field(name);
            snapshot = self.commit(working.clone());

            self.push(Operation::DropColumn {
                table: snapshot.clone(),
                column,
                cascade,
                foreign_key,
            });
        }

        Ok(snapshot)
    }

    /// Rename a field, its column and everything derived from it.
    pub fn rename_field(
        &mut self,
        table: impl TableRef,
        old_name: &str,
        new_name: &str,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let field = require_field(&working, old_name)?.clone();
        if working.has_field(new_name) {
            return Err(SchemaError::duplicate("field", new_name).into());
        }

        let old_column = field.column();
        let mut renamed = field.clone();
        renamed.name = new_name.to_string();
        renamed.column_name = None;
        let new_column = renamed.column();
        let column_changed = old_column != new_column;
        let constraints = !self.dialect.inline_foreign_keys();

        let mut composites = Vec::new();
        let mut old_fk = None;
        if column_changed {
            if field.indexed() {
                self.push(drop_single_index(&working, &old_column));
            }
            composites = self.drop_composites(&working, old_name);
            old_fk = ForeignKeyConstraint::for_field(&working, &field).filter(|_| constraints);
        }
        if let Some(fk) = &old_fk {
            let current = self.orm.require(&working.table_name)?;
            self.push(Operation::DropForeignKeyConstraint {
                table: current,
                name: fk.name.clone(),
            });
        }

        if let Some(slot) = working.fields.iter_mut().find(|f| f.name == old_name) {
            *slot = renamed;
        }
        working.primary_key.rename(old_name, new_name);
        for index in working.indexes.iter_mut() {
            for column in index.columns.iter_mut().filter(|c| c.as_str() == old_name) {
                *column = new_name.to_string();
            }
        }
        let own_table = working.table_name.clone();
        for other in working.fields.iter_mut() {
            if let Some(fk) = other.field_type.as_foreign_key_mut() {
                let local = fk.is_self_reference() || fk.table == own_table;
                if local && fk.field == old_name {
                    fk.field = new_name.to_string();
                }
            }
        }
        let snapshot = self.commit(working);

        if column_changed {
            self.push(Operation::RenameColumn {
                table: ObjectName::of(&snapshot),
                old: old_column,
                new: new_column.clone(),
            });
        }

        // Referencing foreign keys follow the field; the database follows
        // the column on its own.
        for (referrer, fk_field) in self.orm.backrefs(&snapshot.table_name) {
            if referrer == snapshot.table_name {
                continue;
            }
            let mut other = (*self.orm.require(&referrer)?).clone();
            if let Some(fk) = other
                .get_field_mut(&fk_field)
                .and_then(|f| f.field_type.as_foreign_key_mut())
            {
                if fk.field == old_name {
                    fk.field = new_name.to_string();
                    self.commit(other);
                }
            }
        }
        let snapshot = self.orm.require(&snapshot.table_name)?;

        if column_changed {
            let field = snapshot.require_field(new_name)?.clone();
            if field.indexed() {
                self.push(single_index(&snapshot, &new_column, field.unique));
            }
            for mut index in composites {
                for column in index.columns.iter_mut().filter(|c| c.as_str() == old_name) {
                    *column = new_name.to_string();
                }
                self.push(composite_index(&snapshot, &index));
            }
            if old_fk.is_some() {
                if let Some(constraint) = ForeignKeyConstraint::for_field(&snapshot, &field) {
                    self.push(Operation::AddForeignKeyConstraint {
                        table: snapshot.clone(),
                        constraint,
                    });
                }
            }
        }

        Ok(snapshot)
    }

    /// Rename a table, updating referencing foreign keys.
    pub fn rename_table(
        &mut self,
        table: impl TableRef,
        new_name: &str,
    ) -> MigrateResult<Arc<Table>> {
        let current = self.orm.require(table.key())?;
        if current.table_name == new_name {
            return Ok(current);
        }
        if self.orm.contains(new_name) {
            return Err(SchemaError::duplicate("table", new_name).into());
        }
        let old_name = current.table_name.clone();
        let constraints = !self.dialect.inline_foreign_keys();

        let referrer_names: BTreeSet<String> = self
            .orm
            .backrefs(&old_name)
            .into_iter()
            .map(|(referrer, _)| referrer)
            .filter(|referrer| *referrer != old_name)
            .collect();
        let referrers = referrer_names
            .iter()
            .map(|referrer| self.orm.require(referrer))
            .collect::<MigrateResult<Vec<_>>>()?;

        // Derived index and constraint names embed the table name.
        for (name, _, _) in crate::dialect::table_indexes(&current) {
            self.push(Operation::DropIndex {
                table: ObjectName::of(&current),
                name,
            });
        }
        if constraints {
            for field in current.foreign_keys() {
                if let Some(fk) = ForeignKeyConstraint::for_field(&current, field) {
                    self.push(Operation::DropForeignKeyConstraint {
                        table: current.clone(),
                        name: fk.name,
                    });
                }
            }
            for referrer in &referrers {
                for field in referrer.foreign_keys() {
                    let Some(fk) = ForeignKeyConstraint::for_field(referrer, field) else {
                        continue;
                    };
                    if fk.target.name == old_name {
                        self.push(Operation::DropForeignKeyConstraint {
                            table: referrer.clone(),
                            name: fk.name,
                        });
                    }
                }
            }
        }

        self.push(Operation::RenameTable {
            table: ObjectName::of(&current),
            new_name: new_name.to_string(),
        });

        let mut working = (*current).clone();
        working.table_name = new_name.to_string();
        for field in working.fields.iter_mut() {
            if let Some(fk) = field.field_type.as_foreign_key_mut() {
                if fk.table == old_name {
                    fk.table = new_name.to_string();
                }
            }
        }
        self.commit(working);

        let mut updated = Vec::new();
        for referrer in &referrers {
            let mut other = (**referrer).clone();
            for field in other.fields.iter_mut() {
                if let Some(fk) = field.field_type.as_foreign_key_mut() {
                    if fk.table == old_name {
                        fk.table = new_name.to_string();
                    }
                }
            }
            updated.push(self.commit(other));
        }
        let snapshot = self.orm.require(new_name)?;

        for (name, columns, unique) in crate::dialect::table_indexes(&snapshot) {
            self.push(Operation::AddIndex {
                table: ObjectName::of(&snapshot),
                name,
                columns,
                unique,
            });
        }
        if constraints {
            for field in snapshot.foreign_keys() {
                if let Some(constraint) = ForeignKeyConstraint::for_field(&snapshot, field) {
                    self.push(Operation::AddForeignKeyConstraint {
                        table: snapshot.clone(),
                        constraint,
                    });
                }
            }
            for referrer in updated {
                let referrer = self.orm.require(&referrer.table_name)?;
                for field in referrer.foreign_keys() {
                    let Some(constraint) = ForeignKeyConstraint::for_field(&referrer, field) else {
                        continue;
                    };
                    if constraint.target.name == new_name {
                        self.push(Operation::AddForeignKeyConstraint {
                            table: referrer.clone(),
                            constraint,
                        });
                    }
                }
            }
        }

        Ok(snapshot)
    }

    /// Add an index over fields.
    ///
    /// A single field index is carried by the field's flags.
    pub fn add_index<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        fields: &[S],
        unique: bool,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        for name in fields {
            require_field(&working, name.as_ref())?;
        }
        if fields.is_empty() {
            return Err(
                SchemaError::invalid_table(&working.table_name, "index without fields").into(),
            );
        }

        let op = if let [name] = fields {
            let field = working
                .get_field_mut(name.as_ref())
                .ok_or_else(|| MigrationError::not_found(name.as_ref()))?;
            field.unique = unique;
            field.index = !unique;
            let column = field.column();
            let snapshot = self.commit(working);
            single_index(&snapshot, &column, unique)
        } else {
            let index = if unique {
                Index::unique(fields.iter().map(|f| f.as_ref().to_string()))
            } else {
                Index::new(fields.iter().map(|f| f.as_ref().to_string()))
            };
            working
                .indexes
                .retain(|idx| idx.column_set() != index.column_set());
            working.indexes.push(index.clone());
            let snapshot = self.commit(working);
            composite_index(&snapshot, &index)
        };

        self.push(op);
        self.table(table)
    }

    /// Drop an index over fields.
    pub fn drop_index<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        fields: &[S],
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;

        let op = if let [name] = fields {
            let field = working
                .get_field_mut(name.as_ref())
                .ok_or_else(|| MigrationError::not_found(name.as_ref()))?;
            field.unique = false;
            field.index = false;
            let column = field.column();
            let op = drop_single_index(&working, &column);
            self.commit(working);
            op
        } else {
            let wanted = Index::new(fields.iter().map(|f| f.as_ref().to_string()));
            let position = working
                .indexes
                .iter()
                .position(|idx| idx.column_set() == wanted.column_set())
                .ok_or_else(|| {
                    MigrationError::not_found(format!(
                        "index on {}({})",
                        working.table_name,
                        wanted.columns.join(", ")
                    ))
                })?;
            let index = working.indexes.remove(position);
            let op = drop_composite_index(&working, &index);
            self.commit(working);
            op
        };

        self.push(op);
        self.table(table)
    }

    /// Make fields NOT NULL.
    pub fn add_not_null<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        names: impl IntoIterator<Item = S>,
    ) -> MigrateResult<Arc<Table>> {
        self.toggle_null(table, names, false)
    }

    /// Make fields nullable.
    pub fn drop_not_null<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        names: impl IntoIterator<Item = S>,
    ) -> MigrateResult<Arc<Table>> {
        self.toggle_null(table, names, true)
    }

    fn toggle_null<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        names: impl IntoIterator<Item = S>,
        null: bool,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let mut snapshot = self.orm.require(table.key())?;

        for name in names {
            let name = name.as_ref();
            require_field(&working, name)?;
            let column = match working.get_field_mut(name) {
                Some(field) => {
                    field.null = null;
                    field.column()
                }
                None => return Err(MigrationError::not_found(name)),
            };
            snapshot = self.commit(working.clone());
            let op = if null {
                Operation::DropNotNull {
                    table: snapshot.clone(),
                    column,
                }
            } else {
                Operation::AddNotNull {
                    table: snapshot.clone(),
                    column,
                }
            };
            self.push(op);
        }

        Ok(snapshot)
    }

    /// Set a field's default.
    pub fn add_default(
        &mut self,
        table: impl TableRef,
        name: &str,
        default: DefaultValue,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let field = working
            .get_field_mut(name)
            .ok_or_else(|| MigrationError::not_found(format!("{}.{}", table.key(), name)))?;
        field.default = Some(default.clone());
        let column = field.column();
        let snapshot = self.commit(working);
        self.push(Operation::SetDefault {
            table: snapshot.clone(),
            column,
            default,
        });
        Ok(snapshot)
    }

    /// Add a named table constraint.
    pub fn add_constraint(
        &mut self,
        table: impl TableRef,
        name: &str,
        definition: &str,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        if working.constraints.iter().any(|c| c.name == name) {
            return Err(SchemaError::duplicate("constraint", name).into());
        }
        working.constraints.push(Constraint::new(name, definition));
        let snapshot = self.commit(working);
        self.push(Operation::AddConstraint {
            table: snapshot.clone(),
            name: name.to_string(),
            definition: definition.to_string(),
        });
        Ok(snapshot)
    }

    /// Drop named table constraints.
    pub fn drop_constraints<S: AsRef<str>>(
        &mut self,
        table: impl TableRef,
        names: impl IntoIterator<Item = S>,
    ) -> MigrateResult<Arc<Table>> {
        let mut working = self.working_copy(&table)?;
        let mut snapshot = self.orm.require(table.key())?;

        for name in names {
            let name = name.as_ref();
            let before = working.constraints.len();
            working.constraints.retain(|c| c.name != name);
            if working.constraints.len() == before {
                return Err(MigrationError::not_found(format!(
                    "constraint {} on {}",
                    name, working.table_name
                )));
            }
            snapshot = self.commit(working.clone());
            self.push(Operation::DropConstraint {
                table: snapshot.clone(),
                name: name.to_string(),
            });
        }

        Ok(snapshot)
    }

    /// Queue a raw statement.
    pub fn sql(&mut self, sql: impl Into<String>, params: Vec<Literal>) {
        self.push(Operation::RawSql(Statement::with_params(sql, params)));
    }

    /// Queue a callback that runs against the execution context.
    pub fn run<F>(&mut self, label: impl Into<String>, func: F)
    where
        F: Fn(&mut dyn ExecutionContext) -> MigrateResult<()> + Send + Sync + 'static,
    {
        self.push(Operation::RunCallback(Callback {
            label: label.into(),
            func: Arc::new(func),
        }));
    }

    fn drop_composites(&mut self, table: &Table, field: &str) -> Vec<Index> {
        let indexes: Vec<Index> = table.indexes_with(field).into_iter().cloned().collect();
        for index in &indexes {
            self.push(drop_composite_index(table, index));
        }
        indexes
    }
}

fn require_field<'a>(table: &'a Table, name: &str) -> MigrateResult<&'a Field> {
    table
        .get_field(name)
        .ok_or_else(|| MigrationError::not_found(format!("{}.{}", table.table_name, name)))
}

fn index_columns(table: &Table, index: &Index) -> Vec<String> {
    index
        .columns
        .iter()
        .map(|name| {
            table
                .get_field(name)
                .map(Field::column)
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

fn single_index(table: &Table, column: &str, unique: bool) -> Operation {
    Operation::AddIndex {
        table: ObjectName::of(table),
        name: make_index_name(&table.table_name, &[column]),
        columns: vec![column.to_string()],
        unique,
    }
}

fn drop_single_index(table: &Table, column: &str) -> Operation {
    Operation::DropIndex {
        table: ObjectName::of(table),
        name: make_index_name(&table.table_name, &[column]),
    }
}

fn composite_index(table: &Table, index: &Index) -> Operation {
    let columns = index_columns(table, index);
    Operation::AddIndex {
        table: ObjectName::of(table),
        name: make_index_name(&table.table_name, &columns),
        columns,
        unique: index.unique,
    }
}

fn drop_composite_index(table: &Table, index: &Index) -> Operation {
    Operation::DropIndex {
        table: ObjectName::of(table),
        name: make_index_name(&table.table_name, &index_columns(table, index)),
    }
}
