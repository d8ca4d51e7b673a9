//! Logging setup for the CLI

use crate::config::validate_log_level;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Get the log filter for a verbosity level
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Pure: choose the log filter directive.
///
/// Any `-v` wins; otherwise `RUST_LOG` if set, then the configured level.
pub fn log_directive(verbose: u8, rust_log: Option<String>, configured: &str) -> String {
    if verbose > 0 {
        return get_log_level(verbose).to_string();
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Build the log filter, falling back to `info` when `directive` is invalid.
///
/// The second value is the rejection reason, if any.
pub fn build_filter(directive: &str) -> (EnvFilter, Option<String>) {
    match validate_log_level(directive) {
        Ok(()) => (EnvFilter::new(directive), None),
        Err(e) => (EnvFilter::new(get_log_level(0)), Some(e.to_string())),
    }
}

/// Install the global tracing subscriber, logging to stderr
pub fn init_logging(verbose: u8, configured: &str) {
    let directive = log_directive(verbose, std::env::var("RUST_LOG").ok(), configured);
    let (filter, rejected) = build_filter(&directive);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();

    if let Some(reason) = rejected {
        warn!("Ignoring log filter, using info: {}", reason);
    }
}
