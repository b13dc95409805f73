//! Logging setup for ghfeed.
//!
//! Logs go to stderr so that stdout stays free for chat output; a log file
//! can be added through `[logging] file`. `RUST_LOG` takes precedence over the
//! configured level when it is set.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{GhFeedError, Result};

/// HTTP stack crates that are only interesting when something is wrong.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Map a configured level name to a tracing level; unknown names mean info.
fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Filter used when `RUST_LOG` is absent.
fn default_filter(level: &str) -> String {
    let mut directives = vec![parse_level(level).to_string().to_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|t| t.to_string()));
    directives.join(",")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)))
}

/// Install the global subscriber described by `config`.
///
/// Fails when the log file cannot be opened or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let Some(file) = &config.file else {
        init_console_only(&config.level);
        return Ok(());
    };

    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new().create(true).append(true).open(file)?;
    let writer = std::io::stderr.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(env_filter(&config.level))
        .try_init()
        .map_err(|e| GhFeedError::Config(format!("failed to install logger: {e}")))
}

/// Install a stderr-only subscriber. Does nothing if one is already set.
pub fn init_console_only(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(level))
        .try_init();
}
