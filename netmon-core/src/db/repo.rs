//! Database repository layer
//!
//! Provides insert and query operations for recorded samples, and the
//! [`TabularSource`] implementation the exporter reads from.

use crate::columns;
use crate::error::{Error, Result};
use crate::source::{RowVisitor, TabularSource};
use crate::types::{Cell, Sample};
use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::SourceUnavailable("database connection lock poisoned".to_string()))
    }

    // ============================================
    // Sample operations
    // ============================================

    /// Record one sample, returning its row id.
    pub fn insert_sample(&self, sample: &Sample) -> Result<i64> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO samples ({}) VALUES ({})",
            columns::KNOWN_COLUMNS.join(", "),
            (1..=columns::KNOWN_COLUMNS.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let values: Vec<Cell> = columns::KNOWN_COLUMNS
            .iter()
            .map(|c| sample.get(c))
            .collect();
        conn.execute(&sql, params_from_iter(values.iter()))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, timestamp = %sample.timestamp, "Recorded sample");
        Ok(id)
    }

    /// Number of recorded samples.
    pub fn count_samples(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM samples", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Timestamp of the most recent sample.
    pub fn latest_sample_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let millis: Option<i64> = conn
            .query_row(
                "SELECT timestamp FROM samples ORDER BY timestamp DESC LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()?;
        Ok(millis.and_then(DateTime::<Utc>::from_timestamp_millis))
    }

    /// Delete every recorded sample, returning how many were removed.
    pub fn clear_samples(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM samples", [])?;
        tracing::info!(removed, "Cleared samples");
        Ok(removed)
    }
}

impl TabularSource for Database {
    fn scan(&self, visitor: &mut dyn RowVisitor) -> Result<()> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT * FROM samples ORDER BY timestamp ASC, id ASC")
            .map_err(|e| Error::SourceUnavailable(e.to_string()))?;

        let names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let ts_index = names.iter().position(|c| c == columns::TIMESTAMP);

        let mut rows = stmt
            .query([])
            .map_err(|e| Error::SourceUnavailable(e.to_string()))?;

        visitor.columns(&names)?;

        let mut cells = Vec::with_capacity(names.len());
        while let Some(row) = rows.next()? {
            cells.clear();
            for i in 0..names.len() {
                cells.push(Cell::from_sql(row.get_ref(i)?, Some(i) == ts_index));
            }
            visitor.row(&cells)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_sample(secs: i64, network_type: &str) -> Sample {
        Sample::new(Utc.timestamp_opt(secs, 0).unwrap())
            .with(columns::NETWORK_TYPE, Cell::Text(network_type.to_string()))
            .unwrap()
            .with(columns::WIFI_RSSI, Cell::Integer(-60))
            .unwrap()
    }

    #[derive(Default)]
    struct Collect {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    }

    impl RowVisitor for Collect {
        fn columns(&mut self, names: &[String]) -> Result<()> {
            self.columns = names.to_vec();
            Ok(())
        }

        fn row(&mut self, cells: &[Cell]) -> Result<()> {
            self.rows.push(cells.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_insert_and_count() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        assert_eq!(db.count_samples().unwrap(), 0);
        assert!(db.latest_sample_at().unwrap().is_none());

        db.insert_sample(&create_test_sample(1_000, "WIFI")).unwrap();
        db.insert_sample(&create_test_sample(2_000, "MOBILE")).unwrap();

        assert_eq!(db.count_samples().unwrap(), 2);
        assert_eq!(
            db.latest_sample_at().unwrap(),
            Some(Utc.timestamp_opt(2_000, 0).unwrap())
        );

        assert_eq!(db.clear_samples().unwrap(), 2);
        assert_eq!(db.count_samples().unwrap(), 0);
    }

    #[test]
    fn test_scan_orders_by_timestamp() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        db.insert_sample(&create_test_sample(3_000, "C")).unwrap();
        db.insert_sample(&create_test_sample(1_000, "A")).unwrap();
        db.insert_sample(&create_test_sample(2_000, "B")).unwrap();

        let mut collect = Collect::default();
        db.scan(&mut collect).unwrap();

        assert_eq!(collect.columns[0], columns::ID);
        assert_eq!(collect.columns.len(), columns::KNOWN_COLUMNS.len() + 1);
        assert_eq!(collect.rows.len(), 3);

        let network_type = 1 + columns::position(columns::NETWORK_TYPE).unwrap();
        let order: Vec<_> = collect
            .rows
            .iter()
            .map(|r| r[network_type].clone())
            .collect();
        assert_eq!(
            order,
            vec![
                Cell::Text("A".to_string()),
                Cell::Text("B".to_string()),
                Cell::Text("C".to_string())
            ]
        );

        assert_eq!(collect.rows[0][1], Cell::Timestamp(1_000_000));
        let reason = 1 + columns::position(columns::REASON).unwrap();
        assert_eq!(collect.rows[0][reason], Cell::Null);
    }

    #[test]
    fn test_scan_without_table_is_unavailable() {
        let db = Database::open_in_memory().unwrap();

        let mut collect = Collect::default();
        let err = db.scan(&mut collect).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert!(collect.columns.is_empty());
    }
}
