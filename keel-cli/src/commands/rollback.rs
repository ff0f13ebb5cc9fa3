//! `keel rollback` - revert the latest migrations.

use crate::cli::RollbackArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the rollback command
pub fn run(settings: &Settings, args: RollbackArgs) -> CliResult<()> {
    output::header("Rollback");
    super::describe(settings);

    let mut router = super::open_router(settings)?;
    let reverted = router.rollback_many(args.count)?;
    for name in &reverted {
        output::pending(name);
    }
    output::newline();
    output::success(&format!("Rolled back {} migrations", reverted.len()));
    Ok(())
}
