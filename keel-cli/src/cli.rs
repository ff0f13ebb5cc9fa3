//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Keel - versioned, reversible schema migrations
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(version)]
#[command(about = "Keel - versioned, reversible schema migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the configuration file (defaults to ./keel.toml when present)
    #[arg(long, global = true, env = "KEEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database connection URL (sqlite://<path>, sqlite::memory: or a file path)
    #[arg(long, global = true, env = "KEEL_DATABASE_URL")]
    pub database: Option<String>,

    /// Directory where migrations are stored
    #[arg(long, global = true)]
    pub directory: Option<PathBuf>,

    /// Name of the migration history table
    #[arg(long, global = true)]
    pub migratetable: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Create a migration
    Create(CreateArgs),

    /// Roll back the latest migrations
    Rollback(RollbackArgs),

    /// List applied and pending migrations
    List,

    /// Merge all applied migrations into one
    Merge(MergeArgs),
}

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Stop after this migration
    #[arg(long)]
    pub name: Option<String>,

    /// Record migrations as applied without running them
    #[arg(long)]
    pub fake: bool,
}

/// Arguments for the `create` command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name
    pub name: String,

    /// Target schema file to diff against (TOML with [[tables]])
    #[arg(long, value_name = "SCHEMA")]
    pub auto: Option<PathBuf>,
}

/// Arguments for the `rollback` command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Number of latest migrations to roll back
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

/// Arguments for the `merge` command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Name of the merged migration
    #[arg(long, default_value = "initial")]
    pub name: String,
}
