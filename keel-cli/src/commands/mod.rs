//! CLI command implementations.

pub mod create;
pub mod list;
pub mod merge;
pub mod migrate;
pub mod rollback;

use keel_migrate::{DirectorySource, Router, SqliteContext};

use crate::config::{DatabaseUrl, Settings};
use crate::error::CliResult;
use crate::output;

/// Router over the migrations directory and the configured database.
pub type CliRouter = Router<DirectorySource, SqliteContext>;

/// Open the database and build a router.
pub fn open_router(settings: &Settings) -> CliResult<CliRouter> {
    let source = DirectorySource::new(settings.directory.clone())?;
    let ctx = match &settings.database {
        DatabaseUrl::Sqlite(path) => SqliteContext::open(path)?,
        DatabaseUrl::SqliteMemory => SqliteContext::open_in_memory()?,
    };
    tracing::debug!(
        database = %settings.database,
        directory = %settings.directory.display(),
        "Opened router"
    );
    Ok(Router::new(source, ctx, settings.router.clone())?)
}

fn describe(settings: &Settings) {
    output::kv("Database", &settings.database.to_string());
    output::kv("Migrations", &settings.directory.display().to_string());
    output::newline();
}
