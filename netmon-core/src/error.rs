//! Error types for netmon-core

use thiserror::Error;

/// Main error type for the netmon-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored preference could not be coerced to its declared type
    #[error("invalid value {value:?} for preference {key}")]
    InvalidPreference { key: String, value: String },

    /// Text that does not fit the column's storage kind
    #[error("invalid value {value:?} for column {column}")]
    InvalidValue { column: String, value: String },

    /// Column name not part of the recorded schema
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The tabular data source could not be read
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    /// Output format cannot represent the exported data
    #[error("export format error: {0}")]
    Format(String),
}

impl Error {
    /// Whether this error came from writing the export target.
    pub fn is_io(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Csv(e) => e.is_io_error(),
            _ => false,
        }
    }
}

/// Result type alias for netmon-core
pub type Result<T> = std::result::Result<T, Error>;
