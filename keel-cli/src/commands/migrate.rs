//! `keel migrate` - apply pending migrations.

use crate::cli::MigrateArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the migrate command
pub fn run(settings: &Settings, args: MigrateArgs) -> CliResult<()> {
    output::header("Migrate");
    super::describe(settings);

    let mut router = super::open_router(settings)?;
    let applied = router.run(args.name.as_deref(), args.fake)?;

    if applied.is_empty() {
        output::info("There is nothing to migrate");
        return Ok(());
    }
    for name in &applied {
        output::applied(name);
    }
    output::newline();
    if args.fake {
        output::success(&format!("Recorded {} migrations as applied", applied.len()));
    } else {
        output::success(&format!("Applied {} migrations", applied.len()));
    }
    Ok(())
}
