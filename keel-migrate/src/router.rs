//! Migration runner.
//!
//! The [`Router`] compares the migrations a [`MigrationSource`] offers with
//! the history table, rebuilds the registry by replaying applied migrations
//! without touching the database, and applies or reverts migrations one
//! transaction at a time.

use std::collections::HashSet;

use keel_schema::{SchemaSource, Table};
use tracing::{error, info, warn};

use crate::context::{ExecutionContext, NoopContext};
use crate::dialect::DialectKind;
use crate::diff::diff_tables;
use crate::error::{Direction, MigrateResult, MigrationError};
use crate::history::{DEFAULT_HISTORY_TABLE, HistoryEntry, HistoryStore};
use crate::migration::Procedure;
use crate::migrator::Migrator;
use crate::source::{MigrationSource, next_number};

/// Configuration for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Name of the history table.
    pub history_table: String,
    /// Schema namespace of the history table.
    pub schema: Option<String>,
    /// Model names skipped when creating migrations.
    pub ignore: Vec<String>,
    /// SQL dialect.
    pub dialect: DialectKind,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history_table: DEFAULT_HISTORY_TABLE.to_string(),
            schema: None,
            ignore: Vec::new(),
            dialect: DialectKind::default(),
        }
    }
}

impl RouterConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history table name.
    pub fn history_table(mut self, name: impl Into<String>) -> Self {
        self.history_table = name.into();
        self
    }

    /// Set the schema namespace.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the ignored model names.
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    fn is_ignored(&self, table: &Table) -> bool {
        self.ignore.iter().any(|name| *name == table.name)
    }
}

/// Applies migrations from a source to a database.
pub struct Router<S, C> {
    source: S,
    ctx: C,
    config: RouterConfig,
    history: HistoryStore,
}

impl<S: MigrationSource, C: ExecutionContext> Router<S, C> {
    /// Create a router, creating the history table when missing.
    pub fn new(source: S, mut ctx: C, config: RouterConfig) -> MigrateResult<Self> {
        if config.history_table.trim().is_empty() {
            return Err(MigrationError::config("history table name is empty"));
        }
        let history = HistoryStore::new(
            &config.history_table,
            config.schema.as_deref(),
            config.dialect,
        );
        history.ensure(&mut ctx)?;
        Ok(Self {
            source,
            ctx,
            config,
            history,
        })
    }

    /// The migration source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The migration source, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The execution context.
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// The execution context, mutably.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// The configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Consume the router, returning the source and context.
    pub fn into_parts(self) -> (S, C) {
        (self.source, self.ctx)
    }

    /// Available migrations, in application order.
    pub fn todo(&self) -> MigrateResult<Vec<String>> {
        self.source.names()
    }

    /// Applied migrations, in application order.
    pub fn done(&mut self) -> MigrateResult<Vec<String>> {
        self.history.names(&mut self.ctx)
    }

    /// Applied migrations with their timestamps.
    pub fn history(&mut self) -> MigrateResult<Vec<HistoryEntry>> {
        self.history.entries(&mut self.ctx)
    }

    /// Pending migrations: `todo` minus `done`, in `todo` order.
    pub fn diff(&mut self) -> MigrateResult<Vec<String>> {
        let done: HashSet<String> = self.done()?.into_iter().collect();
        Ok(self
            .todo()?
            .into_iter()
            .filter(|name| !done.contains(name))
            .collect())
    }

    /// A migrator holding the schema implied by the applied migrations.
    pub fn migrator(&mut self) -> MigrateResult<Migrator> {
        let mut migrator = Migrator::new(self.config.dialect);
        for name in self.done()? {
            self.run_one(&name, &mut migrator, true, false, false)?;
        }
        Ok(migrator)
    }

    /// Run or emulate one migration.
    ///
    /// A fake run replays the procedure against the registry only, and
    /// records (or deletes) the history entry when `force` is set. A real
    /// run executes inside one transaction together with the history
    /// update.
    pub fn run_one(
        &mut self,
        name: &str,
        migrator: &mut Migrator,
        fake: bool,
        downgrade: bool,
        force: bool,
    ) -> MigrateResult<()> {
        let migration = self.source.read(name)?;
        let (procedure, direction) = if downgrade {
            (&migration.downgrade, Direction::Down)
        } else {
            (&migration.upgrade, Direction::Up)
        };

        if fake {
            let mut sink = NoopContext::new();
            migrator.fake(|m| procedure.apply(m, &mut sink))?;
            if force {
                self.update_history(name, downgrade)?;
                info!(migration = %name, "Done");
            }
            return Ok(());
        }

        if downgrade {
            info!(migration = %name, "Rolling back");
        } else {
            info!(migration = %name, "Migrate");
        }

        self.ctx.begin()?;
        let checkpoint = migrator.checkpoint();
        let result = self
            .apply(name, procedure, migrator, downgrade)
            .and_then(|()| self.ctx.commit());

        match result {
            Ok(()) => {
                info!(migration = %name, "Done");
                Ok(())
            }
            Err(e) => {
                migrator.restore(checkpoint);
                migrator.discard();
                if let Err(rollback_err) = self.ctx.rollback() {
                    warn!(error = %rollback_err, "Transaction rollback failed");
                }
                error!(migration = %name, error = %e, "{} failed", direction);
                Err(MigrationError::failed(direction, name, e))
            }
        }
    }

    fn apply(
        &mut self,
        name: &str,
        procedure: &Procedure,
        migrator: &mut Migrator,
        downgrade: bool,
    ) -> MigrateResult<()> {
        procedure.apply(migrator, &mut self.ctx)?;
        migrator.flush(&mut self.ctx)?;
        self.update_history(name, downgrade)
    }

    fn update_history(&mut self, name: &str, downgrade: bool) -> MigrateResult<()> {
        if downgrade {
            self.history.remove(&mut self.ctx, name)
        } else {
            self.history.record(&mut self.ctx, name)
        }
    }

    /// Apply pending migrations, stopping after `name` when given.
    ///
    /// With `fake` the history is recorded without executing anything.
    /// Returns the names applied.
    pub fn run(&mut self, name: Option<&str>, fake: bool) -> MigrateResult<Vec<String>> {
        info!("Starting migrations");

        let mut applied = Vec::new();
        let diff = self.diff()?;
        if diff.is_empty() {
            info!("There is nothing to migrate");
            return Ok(applied);
        }
        if let Some(name) = name {
            if !diff.iter().any(|pending| pending == name) {
                return Err(MigrationError::not_found(name));
            }
        }

        let mut migrator = self.migrator()?;
        for pending in diff {
            self.run_one(&pending, &mut migrator, fake, false, fake)?;
            let stop = name == Some(pending.as_str());
            applied.push(pending);
            if stop {
                break;
            }
        }
        Ok(applied)
    }

    /// Revert the latest applied migration.
    ///
    /// `name`, when given, must be the latest applied migration.
    pub fn rollback(&mut self, name: Option<&str>) -> MigrateResult<String> {
        let done = self.done()?;
        let Some(last) = done.last().cloned() else {
            return Err(MigrationError::rollback("No migrations are found."));
        };
        if let Some(name) = name {
            if name.trim() != last {
                return Err(MigrationError::rollback("Only last migration can be canceled."));
            }
        }

        let mut migrator = self.migrator()?;
        self.run_one(&last, &mut migrator, false, true, false)?;
        warn!(migration = %last, "Downgraded migration");
        Ok(last)
    }

    /// Revert the latest `count` migrations, newest first.
    pub fn rollback_many(&mut self, count: usize) -> MigrateResult<Vec<String>> {
        let done = self.done()?.len();
        if count > done {
            return Err(MigrationError::rollback(format!(
                "Unable to rollback {} migrations from {}",
                count, done
            )));
        }
        let mut reverted = Vec::with_capacity(count);
        for _ in 0..count {
            reverted.push(self.rollback(None)?);
        }
        Ok(reverted)
    }

    /// Create a migration.
    ///
    /// Without a target an empty migration is written. With one, the
    /// migration holds the steps from the schema implied by every known
    /// migration to the target and back. Returns `None` when nothing
    /// changed.
    pub fn create(
        &mut self,
        name: &str,
        target: Option<&dyn SchemaSource>,
    ) -> MigrateResult<Option<String>> {
        let number = next_number(&self.todo()?);
        let Some(target) = target else {
            info!(migration = %name, "Creating migration");
            let created = self.source.write(number, name, &[], &[])?;
            info!(migration = %created, "Migration has been created");
            return Ok(Some(created));
        };

        let target: Vec<Table> = target
            .tables()?
            .into_iter()
            .filter(|t| !self.config.is_ignored(t))
            .collect();

        let mut migrator = self.migrator()?;
        for pending in self.diff()? {
            self.run_one(&pending, &mut migrator, true, false, false)?;
        }
        let current: Vec<Table> = migrator
            .tables()
            .iter()
            .filter(|t| !self.config.is_ignored(t))
            .map(|t| (**t).clone())
            .collect();

        let upgrade = diff_tables(&target, &current)?;
        if upgrade.is_empty() {
            warn!("No changes found.");
            return Ok(None);
        }
        let downgrade = diff_tables(&current, &target)?;

        info!(migration = %name, steps = upgrade.len(), "Creating migration");
        let created = self.source.write(number, name, &upgrade, &downgrade)?;
        info!(migration = %created, "Migration has been created");
        Ok(Some(created))
    }

    /// Collapse every applied migration into one.
    ///
    /// The new migration is recorded as applied; the database schema is
    /// left untouched.
    pub fn merge(&mut self, name: &str) -> MigrateResult<String> {
        let current: Vec<Table> = self
            .migrator()?
            .tables()
            .iter()
            .map(|t| (**t).clone())
            .collect();
        let upgrade = diff_tables(&current, &[])?;
        if upgrade.is_empty() {
            error!("Can't merge migrations");
            return Err(MigrationError::NoChanges);
        }
        let downgrade = diff_tables(&[], &current)?;

        self.clear()?;

        info!(migration = %name, "Merge migrations");
        let merged = self.source.write(1, name, &upgrade, &downgrade)?;
        let mut migrator = Migrator::new(self.config.dialect);
        self.run_one(&merged, &mut migrator, true, false, true)?;
        info!(migration = %merged, "Migrations have been merged");
        Ok(merged)
    }

    /// Delete the history and every migration record.
    pub fn clear(&mut self) -> MigrateResult<()> {
        self.history.clear(&mut self.ctx)?;
        for name in self.todo()? {
            self.source.remove(&name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Migration;
    use crate::operation::Statement;
    use crate::source::MemorySource;
    use crate::step::Step;
    use keel_schema::{Field, FieldType, Index, Literal};

    /// Context that remembers executed statements and answers history
    /// queries from its own rows.
    #[derive(Default)]
    struct RecordingContext {
        executed: Vec<String>,
        history: Vec<String>,
        fail_on: Option<String>,
        transactions: Vec<&'static str>,
    }

    impl ExecutionContext for RecordingContext {
        fn execute(&mut self, statement: &Statement) -> MigrateResult<usize> {
            if let Some(pattern) = &self.fail_on {
                if statement.sql.contains(pattern.as_str()) {
                    return Err(MigrationError::database("boom"));
                }
            }
            if statement.sql.starts_with("INSERT INTO \"migratehistory\"") {
                if let Some(Literal::Text(name)) = statement.params.first() {
                    self.history.push(name.clone());
                }
            } else if statement.sql.starts_with("DELETE FROM \"migratehistory\" WHERE") {
                if let Some(Literal::Text(name)) = statement.params.first() {
                    self.history.retain(|n| n != name);
                }
            } else if statement.sql.starts_with("DELETE FROM \"migratehistory\"") {
                self.history.clear();
            }
            self.executed.push(statement.sql.clone());
            Ok(1)
        }

        fn query(
            &mut self,
            _sql: &str,
            _params: &[Literal],
        ) -> MigrateResult<Vec<crate::context::Row>> {
            Ok(self
                .history
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let mut row = crate::context::Row::new();
                    row.insert("id".into(), Literal::Int(i as i64 + 1));
                    row.insert("name".into(), Literal::from(name.as_str()));
                    row
                })
                .collect())
        }

        fn begin(&mut self) -> MigrateResult<()> {
            self.transactions.push("begin");
            Ok(())
        }

        fn commit(&mut self) -> MigrateResult<()> {
            self.transactions.push("commit");
            Ok(())
        }

        fn rollback(&mut self) -> MigrateResult<()> {
            self.transactions.push("rollback");
            Ok(())
        }
    }

    fn person() -> Table {
        Table::new("Person", "person")
            .field(Field::new("id", FieldType::Auto))
            .field(Field::new("name", FieldType::char(100)))
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with(
                Migration::new("001_initial")
                    .up(vec![Step::CreateTable { table: person() }])
                    .down(vec![Step::RemoveTable {
                        table: "person".into(),
                        cascade: false,
                    }]),
            )
            .with(
                Migration::new("002_email")
                    .up(vec![Step::AddFields {
                        table: "person".into(),
                        fields: vec![Field::new("email", FieldType::char(255)).null(true)],
                    }])
                    .down(vec![Step::RemoveFields {
                        table: "person".into(),
                        fields: vec!["email".into()],
                        cascade: false,
                    }]),
            )
    }

    fn router() -> Router<MemorySource, RecordingContext> {
        Router::new(source(), RecordingContext::default(), RouterConfig::default()).unwrap()
    }

    #[test]
    fn test_run_applies_pending_in_order() {
        let mut router = router();
        assert_eq!(router.diff().unwrap(), vec!["001_initial", "002_email"]);

        let applied = router.run(None, false).unwrap();
        assert_eq!(applied, vec!["001_initial", "002_email"]);
        assert_eq!(router.done().unwrap(), vec!["001_initial", "002_email"]);
        assert!(router.diff().unwrap().is_empty());
        assert!(router.run(None, false).unwrap().is_empty());

        let ctx = router.context();
        assert!(ctx.executed.iter().any(|s| s.starts_with("CREATE TABLE \"person\"")));
        assert!(ctx.executed.iter().any(|s| s.contains("ADD COLUMN \"email\"")));
        assert_eq!(ctx.transactions, vec!["begin", "commit", "begin", "commit"]);
    }

    #[test]
    fn test_run_stops_after_name() {
        let mut router = router();
        assert_eq!(router.run(Some("001_initial"), false).unwrap(), vec!["001_initial"]);
        assert_eq!(router.diff().unwrap(), vec!["002_email"]);
        assert!(matches!(
            router.run(Some("009_missing"), false),
            Err(MigrationError::NotFound(_))
        ));
    }

    #[test]
    fn test_fake_run_records_without_executing() {
        let mut router = router();
        router.run(None, true).unwrap();
        assert_eq!(router.done().unwrap(), vec!["001_initial", "002_email"]);
        let ctx = router.context();
        assert!(ctx.executed.iter().all(|s| !s.contains("\"person\"")));
        assert!(ctx.transactions.is_empty());
    }

    #[test]
    fn test_migrator_replays_done() {
        let mut router = router();
        router.run(None, false).unwrap();
        let executed = router.context().executed.len();

        let migrator = router.migrator().unwrap();
        assert!(migrator.table("person").unwrap().has_field("email"));
        assert!(migrator.operations().is_empty());
        assert_eq!(router.context().executed.len(), executed);
    }

    #[test]
    fn test_rollback() {
        let mut router = router();
        assert!(matches!(
            router.rollback(None),
            Err(MigrationError::RollbackFailed(_))
        ));

        router.run(None, false).unwrap();
        assert!(matches!(
            router.rollback(Some("001_initial")),
            Err(MigrationError::RollbackFailed(_))
        ));
        assert_eq!(router.done().unwrap().len(), 2);

        assert_eq!(router.rollback(Some("002_email")).unwrap(), "002_email");
        assert_eq!(router.done().unwrap(), vec!["001_initial"]);
        assert!(router
            .context()
            .executed
            .iter()
            .any(|s| s.contains("DROP COLUMN \"email\"")));
    }

    #[test]
    fn test_rollback_many_checks_count() {
        let mut router = router();
        router.run(None, false).unwrap();
        assert!(router.rollback_many(3).is_err());
        assert_eq!(router.done().unwrap().len(), 2);
        assert_eq!(
            router.rollback_many(2).unwrap(),
            vec!["002_email", "001_initial"]
        );
        assert!(router.done().unwrap().is_empty());
    }

    #[test]
    fn test_failure_rolls_back_and_tags() {
        let mut ctx = RecordingContext::default();
        ctx.fail_on = Some("ADD COLUMN".into());
        let mut router = Router::new(source(), ctx, RouterConfig::default()).unwrap();

        let err = router.run(None, false).unwrap_err();
        assert!(err.to_string().starts_with("Migration failed: 002_email"));
        assert_eq!(router.done().unwrap(), vec!["001_initial"]);
        assert_eq!(
            router.context().transactions,
            vec!["begin", "commit", "begin", "rollback"]
        );
    }

    #[test]
    fn test_create_from_target() {
        let mut router = router();
        router.run(Some("001_initial"), false).unwrap();

        let target = vec![
            person()
                .field(Field::new("email", FieldType::char(255)).null(true))
                .field(Field::new("age", FieldType::Integer).null(true)),
        ];
        let created = router
            .create("add_age", Some(&target as &dyn SchemaSource))
            .unwrap();
        assert_eq!(created.as_deref(), Some("003_add_age"));

        let migration = router.source().read("003_add_age").unwrap();
        let up = migration.upgrade.steps().unwrap();
        assert_eq!(up.len(), 1);
        match &up[0] {
            Step::AddFields { table, fields } => {
                assert_eq!(table, "person");
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].name, "age");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            migration.downgrade.steps().unwrap()[0].to_string(),
            "remove_fields('person', 'age')"
        );

        let unchanged = router
            .create("noop", Some(&target as &dyn SchemaSource))
            .unwrap();
        assert!(unchanged.is_none());
    }

    #[test]
    fn test_create_respects_ignore() {
        let config = RouterConfig::new().ignore(["Audit"]);
        let mut router =
            Router::new(MemorySource::new(), RecordingContext::default(), config).unwrap();
        let target = vec![
            person(),
            Table::new("Audit", "audit").field(Field::new("id", FieldType::Auto)),
        ];
        let created = router
            .create("initial", Some(&target as &dyn SchemaSource))
            .unwrap()
            .unwrap();
        let migration = router.source().read(&created).unwrap();
        let up = migration.upgrade.steps().unwrap();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].table(), Some("person"));
    }

    #[test]
    fn test_create_converges_with_declared_indexes() {
        let mut router = Router::new(
            MemorySource::new(),
            RecordingContext::default(),
            RouterConfig::default(),
        )
        .unwrap();
        let target = vec![
            person()
                .field(Field::new("email", FieldType::char(255)))
                .index(Index::unique(["email"]))
                .index(Index::new(["name", "email"])),
        ];
        let target = &target as &dyn SchemaSource;

        let created = router.create("initial", Some(target)).unwrap();
        assert_eq!(created.as_deref(), Some("001_initial"));
        router.run(None, false).unwrap();
        assert_eq!(router.create("again", Some(target)).unwrap(), None);
        assert_eq!(router.todo().unwrap(), vec!["001_initial"]);
    }

    #[test]
    fn test_create_numbers_past_gaps() {
        let source = MemorySource::new()
            .with(Migration::new("001_a"))
            .with(Migration::new("003_b"));
        let mut router =
            Router::new(source, RecordingContext::default(), RouterConfig::default()).unwrap();

        let created = router.create("b", None).unwrap();
        assert_eq!(created.as_deref(), Some("004_b"));
        assert_eq!(router.todo().unwrap(), vec!["001_a", "003_b", "004_b"]);
    }

    #[test]
    fn test_create_empty_stub() {
        let mut router = router();
        let created = router.create("manual", None).unwrap().unwrap();
        assert_eq!(created, "003_manual");
        assert!(router.source().read(&created).unwrap().upgrade.is_empty());
    }

    #[test]
    fn test_merge() {
        let mut router = router();
        router.run(None, false).unwrap();
        let executed = router.context().executed.len();

        let merged = router.merge("initial").unwrap();
        assert_eq!(merged, "001_initial");
        assert_eq!(router.todo().unwrap(), vec!["001_initial"]);
        assert_eq!(router.done().unwrap(), vec!["001_initial"]);

        let migration = router.source().read("001_initial").unwrap();
        match &migration.upgrade.steps().unwrap()[..] {
            [Step::CreateTable { table }] => assert!(table.has_field("email")),
            other => panic!("unexpected {:?}", other),
        }

        // Only history statements reached the database.
        let after = &router.context().executed[executed..];
        assert!(after.iter().all(|s| s.contains("migratehistory")));
    }

    #[test]
    fn test_merge_without_history() {
        let mut router = router();
        assert!(matches!(router.merge("initial"), Err(MigrationError::NoChanges)));
        assert_eq!(router.todo().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_history_table_name() {
        let config = RouterConfig::new().history_table(" ");
        assert!(matches!(
            Router::new(MemorySource::new(), NoopContext::new(), config),
            Err(MigrationError::Config(_))
        ));
    }
}
