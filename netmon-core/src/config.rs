//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/netmon/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/netmon/` (~/.config/netmon/)
//! - Data: `$XDG_DATA_HOME/netmon/` (~/.local/share/netmon/)
//! - State/Logs: `$XDG_STATE_HOME/netmon/` (~/.local/state/netmon/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Time zone used when rendering timestamp cells
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The host's local time zone
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
}

/// Export configuration
#[derive(Debug, Deserialize, Default)]
pub struct ExportConfig {
    /// Time zone for the `yyyy-MM-dd HH:mm:ss` timestamp column
    #[serde(default)]
    pub timezone: TimeZoneMode,

    /// Folder exports are written to when no output path is given
    pub output_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Folder for export files, falling back to the data directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(Config::data_dir)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,

    /// How often a new log file is started
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
            rotation: LogRotation::default(),
        }
    }
}

/// Log file rotation period
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    /// A single `netmon.log` that grows without limit
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the config directory path
    ///
    /// `$XDG_CONFIG_HOME/netmon/` (~/.config/netmon/)
    pub fn config_dir() -> PathBuf {
        xdg_config_home().join("netmon")
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/netmon/config.toml` (~/.config/netmon/config.toml)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the preferences file path
    ///
    /// `$XDG_CONFIG_HOME/netmon/preferences.toml`
    pub fn preferences_path() -> PathBuf {
        Self::config_dir().join("preferences.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/netmon/` (~/.local/share/netmon/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("netmon")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/netmon/` (~/.local/state/netmon/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("netmon")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/netmon/netmon.db` (~/.local/share/netmon/netmon.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("netmon.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// Called by the CLI before anything else reads these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
