//! `keel create` - create a migration, optionally diffed from a schema file.

use keel_migrate::MigrationSource;
use keel_schema::{SchemaSource, TomlSchema};

use crate::cli::CreateArgs;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the create command
pub fn run(settings: &Settings, args: CreateArgs) -> CliResult<()> {
    output::header("Create Migration");
    super::describe(settings);

    let schema = match &args.auto {
        Some(path) => {
            output::kv("Schema", &path.display().to_string());
            Some(TomlSchema::from_file(path)?)
        }
        None => None,
    };

    let mut router = super::open_router(settings)?;
    let target = schema.as_ref().map(|s| s as &dyn SchemaSource);
    match router.create(&args.name, target)? {
        Some(name) => {
            if let Some(steps) = router.source().read(&name)?.upgrade.steps() {
                for step in steps {
                    output::list_item(&step.to_string());
                }
            }
            output::success(&format!("Migration has been created as '{}'", name));
        }
        None => output::warn("No changes found."),
    }
    Ok(())
}
