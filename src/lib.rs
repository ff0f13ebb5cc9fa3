//! # Keel
//!
//! Versioned, reversible schema migrations with structural auto-diff.
//!
//! Keel provides:
//! - A schema model of tables, fields, indexes and foreign keys
//! - A differ that computes forward and backward migration steps between
//!   two schema snapshots
//! - A schema mutator that keeps a registry of table snapshots in step with
//!   the database and lowers changes to SQL for several dialects
//! - A runner that applies and reverts migrations transactionally and
//!   records them in a history table
//!
//! ## Quick Start
//!
//! ```rust
//! use keel::prelude::*;
//!
//! # fn main() -> keel::migrate::MigrateResult<()> {
//! let target = vec![
//!     Table::new("Person", "person")
//!         .field(Field::new("id", FieldType::Auto))
//!         .field(Field::new("email", FieldType::char(255)).unique(true)),
//! ];
//!
//! let config = RouterConfig::new().dialect(DialectKind::Sqlite);
//! let mut router = Router::new(MemorySource::new(), SqliteContext::open_in_memory()?, config)?;
//!
//! let name = router.create("initial", Some(&target as &dyn SchemaSource))?;
//! assert_eq!(name.as_deref(), Some("001_initial"));
//!
//! router.run(None, false)?;
//! assert_eq!(router.done()?, vec!["001_initial"]);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema model: tables, fields, indexes and target-schema sources.
pub mod schema {
    pub use keel_schema::*;
}

/// Migration engine: differ, migrator, dialects, sources and router.
pub mod migrate {
    pub use keel_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        DialectKind, DirectorySource, ExecutionContext, MemorySource, MigrateResult, Migration,
        MigrationError, MigrationSource, Migrator, Procedure, Router, RouterConfig, SqliteContext,
        Step, diff_tables,
    };
    pub use crate::schema::{
        DefaultValue, Field, FieldType, ForeignKey, Index, Literal, PrimaryKey, SchemaSource,
        Table, TomlSchema,
    };
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, Migrator, Router};
pub use schema::{SchemaError, Table};
