//! Core domain types for netmon
//!
//! A [`Sample`] is one recorded snapshot of connectivity metrics. When it is
//! read back through a tabular source each value becomes a [`Cell`].

use crate::columns::{self, ColumnKind};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use std::collections::BTreeMap;

// ============================================
// Cell
// ============================================

/// A single typed value in a recorded row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
}

impl Cell {
    /// Interpret free text typed on a command line for `column`.
    ///
    /// Empty text is null. Text columns keep the text exactly as typed;
    /// numeric columns accept only finite numbers, and integer columns also
    /// take `true`/`false` as 1/0.
    pub fn parse_for(column: &str, s: &str) -> Result<Self> {
        let kind = columns::kind(column).ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        if s.is_empty() {
            return Ok(Cell::Null);
        }
        let invalid = || Error::InvalidValue {
            column: column.to_string(),
            value: s.to_string(),
        };

        let trimmed = s.trim();
        Ok(match kind {
            ColumnKind::Text => Cell::Text(s.to_string()),
            ColumnKind::Integer => match trimmed {
                "true" => Cell::Integer(1),
                "false" => Cell::Integer(0),
                _ => Cell::Integer(trimmed.parse().map_err(|_| invalid())?),
            },
            ColumnKind::Real => {
                let value: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                Cell::Real(value)
            }
        })
    }

    /// Convert a JSON scalar. Booleans are stored as 0/1 like SQLite does.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as J;
        Ok(match value {
            J::Null => Cell::Null,
            J::Bool(b) => Cell::Integer(i64::from(*b)),
            J::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => Cell::Real(n.as_f64().unwrap_or_default()),
            },
            J::String(s) => Cell::Text(s.clone()),
            J::Array(_) | J::Object(_) => {
                return Err(Error::Config(format!(
                    "sample values must be scalars, got {}",
                    value
                )))
            }
        })
    }

    /// Read a SQLite value. `timestamp` marks the timestamp column.
    pub fn from_sql(value: ValueRef<'_>, timestamp: bool) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) if timestamp => Cell::Timestamp(i),
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }

}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(i) | Cell::Timestamp(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Cell::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Cell::Text(t) => ToSqlOutput::Borrowed(ValueRef::Text(t.as_bytes())),
        })
    }
}

// ============================================
// Sample
// ============================================

/// One recorded snapshot of connectivity metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// Metric values keyed by column name; absent columns are stored as null
    pub values: BTreeMap<String, Cell>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Set a metric value. The timestamp column is not settable this way.
    pub fn set(&mut self, column: &str, value: Cell) -> Result<()> {
        if column == columns::TIMESTAMP || !columns::is_known(column) {
            return Err(Error::UnknownColumn(column.to_string()));
        }
        self.values.insert(column.to_string(), value);
        Ok(())
    }

    /// Builder form of [`Sample::set`].
    pub fn with(mut self, column: &str, value: Cell) -> Result<Self> {
        self.set(column, value)?;
        Ok(self)
    }

    /// Build a sample from a JSON object of `column: scalar` pairs.
    pub fn from_json(timestamp: DateTime<Utc>, json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::Config("sample JSON must be an object".to_string()))?;

        let mut sample = Sample::new(timestamp);
        for (column, value) in object {
            sample.set(column, Cell::from_json(value)?)?;
        }
        Ok(sample)
    }

    /// Build a sample from `column=value` assignments.
    pub fn from_assignments<I, S>(timestamp: DateTime<Utc>, assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sample = Sample::new(timestamp);
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (column, value) = assignment.split_once('=').ok_or_else(|| {
                Error::Config(format!("expected COLUMN=VALUE, got {:?}", assignment))
            })?;
            let column = column.trim();
            sample.set(column, Cell::parse_for(column, value)?)?;
        }
        Ok(sample)
    }

    /// Value for `column`, null when unset.
    pub fn get(&self, column: &str) -> Cell {
        if column == columns::TIMESTAMP {
            return Cell::Timestamp(self.timestamp.timestamp_millis());
        }
        self.values.get(column).cloned().unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_for_text_columns_keep_text() {
        let text = |column, s| Cell::parse_for(column, s).unwrap();
        assert_eq!(text("wifi_ssid", "NaN"), Cell::Text("NaN".to_string()));
        assert_eq!(text("sim_mnc", "01"), Cell::Text("01".to_string()));
        assert_eq!(text("network_operator", "1e3"), Cell::Text("1e3".to_string()));
        assert_eq!(text("extra_info", "inf"), Cell::Text("inf".to_string()));
        assert_eq!(text("wifi_ssid", " cafe "), Cell::Text(" cafe ".to_string()));
        assert_eq!(text("reason", ""), Cell::Null);
    }

    #[test]
    fn test_parse_for_numeric_columns() {
        assert_eq!(Cell::parse_for("battery_level", "80").unwrap(), Cell::Integer(80));
        assert_eq!(Cell::parse_for("is_connected", "true").unwrap(), Cell::Integer(1));
        assert_eq!(Cell::parse_for("device_latitude", "-3.5").unwrap(), Cell::Real(-3.5));

        for (column, value) in [
            ("battery_level", "full"),
            ("wifi_rssi", "-61.5"),
            ("device_latitude", "NaN"),
            ("device_longitude", "inf"),
        ] {
            assert!(
                matches!(Cell::parse_for(column, value), Err(Error::InvalidValue { .. })),
                "{column}={value}"
            );
        }
    }

    #[test]
    fn test_sample_from_json() {
        let json = serde_json::json!({
            "network_type": "WIFI",
            "is_connected": true,
            "wifi_rssi": -61,
            "device_latitude": 45.5,
            "reason": null,
        });
        let sample = Sample::from_json(ts(), &json).unwrap();

        assert_eq!(sample.get("network_type"), Cell::Text("WIFI".to_string()));
        assert_eq!(sample.get("is_connected"), Cell::Integer(1));
        assert_eq!(sample.get("wifi_rssi"), Cell::Integer(-61));
        assert_eq!(sample.get("device_latitude"), Cell::Real(45.5));
        assert_eq!(sample.get("reason"), Cell::Null);
        assert_eq!(sample.get("wifi_ssid"), Cell::Null);
        assert_eq!(
            sample.get("timestamp"),
            Cell::Timestamp(ts().timestamp_millis())
        );
    }

    #[test]
    fn test_sample_rejects_unknown_and_nested() {
        let json = serde_json::json!({ "bogus": 1 });
        assert!(matches!(
            Sample::from_json(ts(), &json),
            Err(Error::UnknownColumn(_))
        ));

        let json = serde_json::json!({ "reason": [1, 2] });
        assert!(Sample::from_json(ts(), &json).is_err());

        assert!(Sample::new(ts()).with("timestamp", Cell::Integer(1)).is_err());
    }

    #[test]
    fn test_sample_from_assignments() {
        let sample =
            Sample::from_assignments(ts(), ["wifi_ssid=home", "battery_level=80", "reason="])
                .unwrap();
        assert_eq!(sample.get("wifi_ssid"), Cell::Text("home".to_string()));
        assert_eq!(sample.get("battery_level"), Cell::Integer(80));
        assert_eq!(sample.get("reason"), Cell::Null);

        assert!(Sample::from_assignments(ts(), ["wifi_ssid"]).is_err());
        assert!(matches!(
            Sample::from_assignments(ts(), ["bogus=1"]),
            Err(Error::UnknownColumn(_))
        ));
    }
}
