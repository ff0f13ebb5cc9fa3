//! Keel CLI - command-line interface for Keel migrations.

use clap::Parser;

use keel_cli::cli::{Cli, Command};
use keel_cli::commands;
use keel_cli::config::{Config, Settings};
use keel_cli::error::CliResult;
use keel_cli::{logging, output};

fn main() {
    // Run the CLI and handle errors
    if let Err(e) = run() {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = Config::discover(cli.global.config.as_deref())?;
    logging::init(cli.global.verbose, &config.logging);
    let settings = Settings::resolve(&config, &cli.global)?;

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(&settings, args),
        Command::Create(args) => commands::create::run(&settings, args),
        Command::Rollback(args) => commands::rollback::run(&settings, args),
        Command::List => commands::list::run(&settings),
        Command::Merge(args) => commands::merge::run(&settings, args),
    }
}
