//! Logging setup for the CLI.
//!
//! # Environment Variables
//!
//! - `KEEL_LOG_LEVEL=trace|debug|info|warn|error` - Set the log level
//! - `KEEL_LOG_FORMAT=pretty|compact|json` - Set the output format (default: compact)
//!
//! Without `KEEL_LOG_LEVEL` the level comes from `-v` (info, debug, trace),
//! then from `[logging] level` in `keel.toml`, and is `warn` otherwise.
//! Logs go to stderr.

use std::env;
use std::sync::Once;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

fn normalize_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Resolve the log level.
pub fn get_log_level(verbose: u8, config: &LoggingConfig) -> &'static str {
    if let Some(level) = env::var("KEEL_LOG_LEVEL")
        .ok()
        .as_deref()
        .and_then(normalize_level)
    {
        return level;
    }
    match verbose {
        0 => config
            .level
            .as_deref()
            .and_then(normalize_level)
            .unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Resolve the log format.
pub fn get_log_format(config: &LoggingConfig) -> &'static str {
    let format = env::var("KEEL_LOG_FORMAT")
        .ok()
        .or_else(|| config.format.clone());
    match format.as_deref().map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("json") => "json",
        _ => "compact",
    }
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init(verbose: u8, config: &LoggingConfig) {
    INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let level = get_log_level(verbose, config);
        let filter = EnvFilter::try_new(format!(
            "keel={},keel_cli={},keel_migrate={},keel_schema={}",
            level, level, level, level
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        let format = get_log_format(config);
        let result = match format {
            "json" => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            "pretty" => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init(),
            _ => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
        };

        if result.is_ok() {
            tracing::debug!(level = level, format = format, "Keel logging initialized");
        }
    });
}
