//! Formatting helpers shared by the export formats.

use crate::config::TimeZoneMode;
use crate::types::Cell;
use chrono::{DateTime, Local, Utc};

/// Pattern for exported timestamps, `yyyy-MM-dd HH:mm:ss`.
///
/// Only numeric fields, so the output does not depend on locale.
pub const TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Format epoch milliseconds with [`TIMESTAMP_PATTERN`].
///
/// Out-of-range values fall back to the raw number.
pub fn format_timestamp(millis: i64, zone: TimeZoneMode) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(ts) => match zone {
            TimeZoneMode::Utc => ts.format(TIMESTAMP_PATTERN).to_string(),
            TimeZoneMode::Local => ts
                .with_timezone(&Local)
                .format(TIMESTAMP_PATTERN)
                .to_string(),
        },
        None => millis.to_string(),
    }
}

/// Render a cell as export text. Null becomes the empty string.
pub fn render_cell(cell: &Cell, zone: TimeZoneMode) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Integer(i) => i.to_string(),
        Cell::Real(f) => f.to_string(),
        Cell::Text(t) => t.clone(),
        Cell::Timestamp(ms) => format_timestamp(*ms, zone),
    }
}

/// Escape text for HTML and XML markup.
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
