//! `keel merge` - collapse applied migrations into one.

use crate::cli::MergeArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the merge command
pub fn run(settings: &Settings, args: MergeArgs) -> CliResult<()> {
    output::header("Merge Migrations");
    super::describe(settings);

    let mut router = super::open_router(settings)?;
    let merged = router.merge(&args.name)?;
    output::success(&format!("Migrations have been merged into '{}'", merged));
    Ok(())
}
