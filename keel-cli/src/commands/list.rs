//! `keel list` - show applied and pending migrations.

use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the list command
pub fn run(settings: &Settings) -> CliResult<()> {
    output::header("List of migrations");
    super::describe(settings);

    let mut router = super::open_router(settings)?;
    let done = router.done()?;
    let diff = router.diff()?;

    for name in &done {
        output::applied(name);
    }
    for name in &diff {
        output::pending(name);
    }
    output::newline();
    output::dim(&format!("Done: {}, Pending: {}", done.len(), diff.len()));
    Ok(())
}
