//! # Logging Module
//!
//! Sets up `tracing` output: console always, plus a daily rolling file when
//! a log directory is configured.

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::DebugConfig;
use crate::error::{Gdl90BridgeError, Result};

/// File name prefix for rolling log files
pub const LOG_FILE_PREFIX: &str = "gdl90-bridge.log";

/// Default level for the configured debug settings
pub fn default_level(debug: &DebugConfig) -> Level {
    if debug.debug_logging || debug.log_messages {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Filter from `RUST_LOG` when it is set, else the configured default level
pub fn build_filter(debug: &DebugConfig) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(env.as_deref(), debug)
}

/// Build the filter from an explicit directive string
///
/// A non-empty, parseable `directives` wins outright. Anything else falls
/// back to [`default_level`].
pub fn filter_from(directives: Option<&str>, debug: &DebugConfig) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level(debug).as_str().to_ascii_lowercase()))
}

/// Install the global subscriber
///
/// # Returns
///
/// * `Result<Option<WorkerGuard>>` - Guard that flushes the log file when
///   dropped; `None` when logging to the console only
///
/// # Errors
///
/// Returns error if a global subscriber is already installed
pub fn init(debug: &DebugConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = if debug.log_dir.trim().is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(debug.log_dir.trim(), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(build_filter(debug))
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| Gdl90BridgeError::Logging(e.to_string()))?;

    Ok(guard)
}
