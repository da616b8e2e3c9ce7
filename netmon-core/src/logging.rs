//! Logging for netmon
//!
//! Everything is written to rolling files under `$XDG_STATE_HOME/netmon/`,
//! named `netmon.log.<period>`, or plain `netmon.log` when rotation is off.

use crate::config::{Config, LogRotation, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix shared by every log file name.
pub const LOG_FILE_PREFIX: &str = "netmon.log";

/// Keeps the background log writer alive; pending lines are flushed on drop.
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Folder holding the log files.
pub fn log_dir() -> PathBuf {
    Config::state_dir()
}

/// Start file logging for the process.
///
/// `RUST_LOG` overrides `config.level`.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;

    let (writer, worker) = tracing_appender::non_blocking(file_appender(config, &dir)?);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(
        dir = %dir.display(),
        level = %config.level,
        rotation = ?config.rotation,
        "Logging initialized"
    );
    Ok(LoggingGuard { _worker: worker })
}

/// Log to the test harness output. Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Newest log file in `dir`, if anything has been logged yet.
///
/// Rotated names end in their period (`netmon.log.2026-10-17`), so the
/// newest one sorts last.
pub fn latest_log_file(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .max()
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

fn file_appender(config: &LoggingConfig, dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("cannot log to {}: {}", dir.display(), e)))
}

/// An unparsable configured level falls back to `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
