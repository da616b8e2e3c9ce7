//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: samples table
    r#"
    CREATE TABLE IF NOT EXISTS samples (
        id                       INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp                INTEGER NOT NULL,
        socket_connection_test   TEXT,
        http_connection_test     TEXT,
        network_type             TEXT,
        mobile_data_network_type TEXT,
        is_connected             INTEGER,
        is_roaming               INTEGER,
        is_available             INTEGER,
        is_failover              INTEGER,
        data_activity            TEXT,
        data_state               TEXT,
        reason                   TEXT,
        extra_info               TEXT,
        wifi_ssid                TEXT,
        wifi_bssid               TEXT,
        wifi_signal_strength     INTEGER,
        wifi_rssi                INTEGER,
        sim_operator             TEXT,
        sim_mcc                  TEXT,
        sim_mnc                  TEXT,
        network_operator         TEXT,
        network_mcc              TEXT,
        network_mnc              TEXT,
        cell_signal_strength     INTEGER,
        device_latitude          REAL,
        device_longitude         REAL,
        battery_level            INTEGER
    );
    "#,
    // Version 2: exports and pruning walk samples by time
    r#"
    CREATE INDEX IF NOT EXISTS idx_samples_timestamp ON samples(timestamp);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
