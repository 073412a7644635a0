//! Tracing subscriber setup

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Variable naming the log level
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Set by the AWS Lambda runtime; switches output to JSON lines
pub const LAMBDA_MARKER_VAR: &str = "AWS_EXECUTION_ENV";

/// Filter directive for the given verbosity and `LOG_LEVEL` value
pub fn filter_directive(verbose: bool, level: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    let level = level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or("info")
        .to_lowercase();
    // Also accept the `warning` and `critical` spellings
    match level.as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        _ => level,
    }
}

/// Install the global subscriber
pub fn init(verbose: bool) -> Result<()> {
    let level = std::env::var(LOG_LEVEL_VAR).ok();
    let directive = filter_directive(verbose, level.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log level: {}", directive))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if std::env::var_os(LAMBDA_MARKER_VAR).is_some() {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
