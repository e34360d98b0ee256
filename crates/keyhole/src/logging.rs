#![forbid(unsafe_code)]

//! Tracing subscriber initialization.
//!
//! The display owns the terminal, so logs never go to stderr: they are
//! appended to the configured log file, or discarded.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `KEYHOLE_LOG` env var (full directives, e.g. `keyhole=debug,warn`)
//! 2. The configured `log_level`

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

/// Map a configured level name to a filter. `warning` and `warn` are synonyms.
#[must_use]
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    let level = match name.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => LevelFilter::OFF,
        "error" | "critical" => LevelFilter::ERROR,
        "warning" | "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => return None,
    };
    Some(level)
}

/// Install the global subscriber.
///
/// A second call leaves the first subscriber in place.
///
/// # Errors
///
/// Fails if the log file cannot be opened for appending.
pub fn init(config: &LogConfig) -> io::Result<()> {
    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };

    let directives = std::env::var("KEYHOLE_LOG").ok();
    let filter = build_env_filter(config.level, directives.as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
        .ok();
    Ok(())
}

fn build_env_filter(level: LevelFilter, directives: Option<&str>) -> EnvFilter {
    // Unparseable directives fall back to the configured level.
    if let Some(directives) = directives
        && let Ok(filter) = EnvFilter::try_new(directives)
    {
        return filter;
    }
    EnvFilter::new(level.to_string())
}
