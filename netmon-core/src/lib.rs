//! # netmon-core
//!
//! Core library for netmon - a network connectivity monitor.
//!
//! This library provides:
//! - Domain types for recorded samples and their cells
//! - SQLite storage for samples
//! - File export to CSV, HTML and KML
//! - Typed user preferences
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use netmon_core::export::{ExportFormatKind, ExportOptions, FileExport};
//! use netmon_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! // Export everything recorded so far
//! let options = ExportOptions {
//!     timezone: config.export.timezone,
//!     ..Default::default()
//! };
//! FileExport::new("netmon.csv", ExportFormatKind::Csv, options)
//!     .export(&db)
//!     .expect("export failed");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use preferences::{Preferences, SchedulerKind};
pub use source::{MemorySource, RowVisitor, TabularSource};
pub use types::*;

// Public modules
pub mod chooser;
pub mod columns;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod preferences;
pub mod source;
pub mod types;
