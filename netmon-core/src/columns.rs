//! Recorded metric columns
//!
//! The schema order here is the order of the `samples` table and the order
//! used whenever "all columns" are requested.

use crate::error::{Error, Result};

/// Internal row identifier. Never exported.
pub const ID: &str = "id";
/// Sample time in milliseconds since the Unix epoch.
pub const TIMESTAMP: &str = "timestamp";
pub const SOCKET_CONNECTION_TEST: &str = "socket_connection_test";
pub const HTTP_CONNECTION_TEST: &str = "http_connection_test";
pub const NETWORK_TYPE: &str = "network_type";
pub const MOBILE_DATA_NETWORK_TYPE: &str = "mobile_data_network_type";
pub const IS_CONNECTED: &str = "is_connected";
pub const IS_ROAMING: &str = "is_roaming";
pub const IS_AVAILABLE: &str = "is_available";
pub const IS_FAILOVER: &str = "is_failover";
pub const DATA_ACTIVITY: &str = "data_activity";
pub const DATA_STATE: &str = "data_state";
pub const REASON: &str = "reason";
pub const EXTRA_INFO: &str = "extra_info";
pub const WIFI_SSID: &str = "wifi_ssid";
pub const WIFI_BSSID: &str = "wifi_bssid";
pub const WIFI_SIGNAL_STRENGTH: &str = "wifi_signal_strength";
pub const WIFI_RSSI: &str = "wifi_rssi";
pub const SIM_OPERATOR: &str = "sim_operator";
pub const SIM_MCC: &str = "sim_mcc";
pub const SIM_MNC: &str = "sim_mnc";
pub const NETWORK_OPERATOR: &str = "network_operator";
pub const NETWORK_MCC: &str = "network_mcc";
pub const NETWORK_MNC: &str = "network_mnc";
pub const CELL_SIGNAL_STRENGTH: &str = "cell_signal_strength";
pub const DEVICE_LATITUDE: &str = "device_latitude";
pub const DEVICE_LONGITUDE: &str = "device_longitude";
pub const BATTERY_LEVEL: &str = "battery_level";

/// Every recorded column in schema order, excluding [`ID`].
pub const KNOWN_COLUMNS: &[&str] = &[
    TIMESTAMP,
    SOCKET_CONNECTION_TEST,
    HTTP_CONNECTION_TEST,
    NETWORK_TYPE,
    MOBILE_DATA_NETWORK_TYPE,
    IS_CONNECTED,
    IS_ROAMING,
    IS_AVAILABLE,
    IS_FAILOVER,
    DATA_ACTIVITY,
    DATA_STATE,
    REASON,
    EXTRA_INFO,
    WIFI_SSID,
    WIFI_BSSID,
    WIFI_SIGNAL_STRENGTH,
    WIFI_RSSI,
    SIM_OPERATOR,
    SIM_MCC,
    SIM_MNC,
    NETWORK_OPERATOR,
    NETWORK_MCC,
    NETWORK_MNC,
    CELL_SIGNAL_STRENGTH,
    DEVICE_LATITUDE,
    DEVICE_LONGITUDE,
    BATTERY_LEVEL,
];

/// How values of a column are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    /// SQLite type name used for the column in the `samples` table.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

/// Storage kind of a recorded column, `None` for unknown names.
///
/// Operator codes (MCC/MNC) are text: `01` and `001` are different networks.
pub fn kind(name: &str) -> Option<ColumnKind> {
    let kind = match name {
        TIMESTAMP | IS_CONNECTED | IS_ROAMING | IS_AVAILABLE | IS_FAILOVER
        | WIFI_SIGNAL_STRENGTH | WIFI_RSSI | CELL_SIGNAL_STRENGTH | BATTERY_LEVEL => {
            ColumnKind::Integer
        }
        DEVICE_LATITUDE | DEVICE_LONGITUDE => ColumnKind::Real,
        other if is_known(other) => ColumnKind::Text,
        _ => return None,
    };
    Some(kind)
}

/// All known column names, in schema order.
pub fn column_names() -> Vec<String> {
    KNOWN_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Whether `name` is a recorded column.
pub fn is_known(name: &str) -> bool {
    KNOWN_COLUMNS.contains(&name)
}

/// Position of `name` in schema order.
pub fn position(name: &str) -> Option<usize> {
    KNOWN_COLUMNS.iter().position(|c| *c == name)
}

/// Validate a single column choice.
pub fn choose_one(name: &str) -> Result<String> {
    let name = name.trim();
    if is_known(name) {
        Ok(name.to_string())
    } else {
        Err(Error::UnknownColumn(name.to_string()))
    }
}

/// Validate a multi-column choice and return it in schema order.
///
/// Duplicates collapse; blank entries are ignored.
pub fn choose_many<I, S>(names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut picked = vec![false; KNOWN_COLUMNS.len()];
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        let idx = position(name).ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        picked[idx] = true;
    }

    Ok(KNOWN_COLUMNS
        .iter()
        .zip(picked)
        .filter(|(_, p)| *p)
        .map(|(c, _)| c.to_string())
        .collect())
}
