//! # keel-migrate
//!
//! Migration engine for Keel.
//!
//! This crate provides:
//! - A schema mutator ([`Migrator`]) that keeps a registry of table
//!   snapshots and queues the operations needed to evolve a database
//! - Dialects lowering operations to SQL for generic ANSI, PostgreSQL,
//!   MySQL and SQLite (with table rebuilds where SQLite cannot alter)
//! - A structural differ producing declarative [`Step`]s in both directions
//! - Migration sources (TOML files in a directory, or code)
//! - A [`Router`] that applies and reverts migrations transactionally and
//!   tracks them in a history table
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌───────────────┐
//! │ Target tables│────▶│   Differ   │────▶│ Migration file│
//! └──────────────┘     └────────────┘     └───────────────┘
//!                            ▲                    │
//!                            │                    ▼
//!                      ┌───────────┐      ┌───────────────┐
//!                      │ Registry  │◀─────│   Migrator    │
//!                      └───────────┘      └───────────────┘
//!                                                 │ flush
//!                                                 ▼
//!                                         ┌───────────────┐
//!                                         │ Dialect → SQL │
//!                                         └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use keel_migrate::{Migration, MemorySource, Router, RouterConfig, SqliteContext, Step};
//! use keel_schema::{Field, FieldType, Table};
//!
//! # fn main() -> keel_migrate::MigrateResult<()> {
//! let person = Table::new("Person", "person")
//!     .field(Field::new("id", FieldType::Auto))
//!     .field(Field::new("name", FieldType::char(100)));
//!
//! let source = MemorySource::new().with(
//!     Migration::new("001_initial")
//!         .up(vec![Step::CreateTable { table: person }])
//!         .down(vec![Step::RemoveTable { table: "person".into(), cascade: false }]),
//! );
//!
//! let config = RouterConfig::new().dialect(keel_migrate::DialectKind::Sqlite);
//! let mut router = Router::new(source, SqliteContext::open_in_memory()?, config)?;
//! router.run(None, false)?;
//! assert_eq!(router.done()?, vec!["001_initial"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Migration Files
//!
//! A [`DirectorySource`] keeps one TOML file per migration:
//!
//! ```toml
//! # migrations/002_add_email.toml
//! [[upgrade]]
//! op = "add_fields"
//! table = "person"
//! fields = [{ name = "email", type = "char", max_length = 255, null = true }]
//!
//! [[downgrade]]
//! op = "remove_fields"
//! table = "person"
//! fields = ["email"]
//! ```

pub mod context;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod history;
pub mod migration;
pub mod migrator;
pub mod operation;
pub mod orm;
pub mod router;
pub mod source;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod step;

pub use context::{ExecutionContext, NoopContext, Row};
pub use dialect::{
    Dialect, DialectKind, GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect,
};
pub use diff::{diff_table, diff_tables};
pub use error::{Direction, MigrateResult, MigrationError};
pub use history::{DEFAULT_HISTORY_TABLE, HistoryEntry, HistoryStore};
pub use migration::{Migration, Procedure};
pub use migrator::{Migrator, TableRef};
pub use operation::{Operation, Statement};
pub use orm::Orm;
pub use router::{Router, RouterConfig};
pub use source::{
    DirectorySource, MemorySource, MigrationFile, MigrationSource, migration_name, next_number,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteContext;
pub use step::Step;
