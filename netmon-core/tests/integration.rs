//! Integration tests for the sample store and the export pipeline
//!
//! Samples are recorded into a real SQLite file, exported, and the output
//! is read back to check what reached the file.

use chrono::{TimeZone, Utc};
use netmon_core::columns;
use netmon_core::config::TimeZoneMode;
use netmon_core::export::{ExportFormatKind, ExportOptions, FileExport};
use netmon_core::preferences::{MemoryStore, Preferences};
use netmon_core::{Cell, Database, Sample};
use std::path::PathBuf;
use tempfile::TempDir;

/// Open a migrated database inside `dir`.
fn open_db(dir: &TempDir) -> Database {
    let db = Database::open(&dir.path().join("netmon.db")).expect("open database");
    db.migrate().expect("migrate");
    db
}

fn sample(secs: i64, socket: &str, location: Option<(f64, f64)>) -> Sample {
    let mut sample = Sample::new(Utc.timestamp_opt(secs, 0).unwrap());
    sample
        .set(columns::SOCKET_CONNECTION_TEST, Cell::Text(socket.to_string()))
        .unwrap();
    sample
        .set(columns::NETWORK_TYPE, Cell::Text("WIFI".to_string()))
        .unwrap();
    sample
        .set(columns::WIFI_SSID, Cell::Text("cafe, upstairs".to_string()))
        .unwrap();
    if let Some((lat, lon)) = location {
        sample
            .set(columns::DEVICE_LATITUDE, Cell::Real(lat))
            .unwrap();
        sample
            .set(columns::DEVICE_LONGITUDE, Cell::Real(lon))
            .unwrap();
    }
    sample
}

fn seed(db: &Database) {
    // Recorded out of order on purpose.
    db.insert_sample(&sample(1_391_400_316, "FAIL", None)).unwrap();
    db.insert_sample(&sample(1_391_400_306, "PASS", Some((45.5, -73.6))))
        .unwrap();
    db.insert_sample(&sample(1_391_400_326, "PASS", Some((45.6, -73.5))))
        .unwrap();
}

fn utc_options() -> ExportOptions {
    ExportOptions {
        timezone: TimeZoneMode::Utc,
        ..Default::default()
    }
}

fn export(db: &Database, dir: &TempDir, kind: ExportFormatKind) -> PathBuf {
    let target = dir.path().join(format!("out.{}", kind.extension()));
    FileExport::new(&target, kind, utc_options())
        .export(db)
        .expect("export should succeed")
        .path
}

#[test]
fn test_csv_export_shape_and_order() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    seed(&db);

    let path = export(&db, &dir, ExportFormatKind::Csv);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, columns::column_names());
    assert!(!headers.iter().any(|h| h == columns::ID));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == columns::KNOWN_COLUMNS.len()));

    let timestamps: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(
        timestamps,
        vec![
            "2014-02-03 04:05:06",
            "2014-02-03 04:05:16",
            "2014-02-03 04:05:26"
        ]
    );
}

#[test]
fn test_csv_export_reads_back_values() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    seed(&db);

    let path = export(&db, &dir, ExportFormatKind::Csv);
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let first = reader.records().next().unwrap().unwrap();

    let col = |name: &str| first[columns::position(name).unwrap()].to_string();
    assert_eq!(col(columns::SOCKET_CONNECTION_TEST), "PASS");
    assert_eq!(col(columns::WIFI_SSID), "cafe, upstairs");
    assert_eq!(col(columns::DEVICE_LATITUDE), "45.5");
    assert_eq!(col(columns::DEVICE_LONGITUDE), "-73.6");
    // Never recorded, so null, so empty.
    assert_eq!(col(columns::REASON), "");
    assert_eq!(col(columns::BATTERY_LEVEL), "");
}

#[test]
fn test_empty_database_exports_header_only() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);

    let path = export(&db, &dir, ExportFormatKind::Csv);
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("timestamp,"));
}

#[test]
fn test_typed_text_round_trips_through_csv() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let typed = Sample::from_assignments(
        Utc.timestamp_opt(1_391_400_306, 0).unwrap(),
        [
            "wifi_ssid=NaN",
            "sim_mnc=01",
            "network_operator=1e3",
            "extra_info=inf",
            "wifi_rssi=-61",
            "device_latitude=45.5",
        ],
    )
    .unwrap();
    db.insert_sample(&typed).unwrap();

    let path = export(&db, &dir, ExportFormatKind::Csv);
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let row = reader.records().next().unwrap().unwrap();

    let col = |name: &str| row[columns::position(name).unwrap()].to_string();
    assert_eq!(col(columns::WIFI_SSID), "NaN");
    assert_eq!(col(columns::SIM_MNC), "01");
    assert_eq!(col(columns::NETWORK_OPERATOR), "1e3");
    assert_eq!(col(columns::EXTRA_INFO), "inf");
    assert_eq!(col(columns::WIFI_RSSI), "-61");
    assert_eq!(col(columns::DEVICE_LATITUDE), "45.5");
}

#[test]
fn test_html_export_has_one_row_per_sample() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    seed(&db);

    let path = export(&db, &dir, ExportFormatKind::Html);
    let html = std::fs::read_to_string(path).unwrap();
    assert_eq!(html.matches("<tr class=").count(), 3);
    assert_eq!(
        html.matches("<th>").count(),
        columns::KNOWN_COLUMNS.len()
    );
}

#[test]
fn test_kml_export_uses_preferred_column() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    seed(&db);

    let mut prefs = Preferences::new(MemoryStore::new());
    prefs.set_kml_export_column(columns::NETWORK_TYPE).unwrap();

    let options = ExportOptions {
        timezone: TimeZoneMode::Utc,
        kml_column: prefs.kml_export_column(),
    };
    let target = dir.path().join("out.kml");
    let summary = FileExport::new(&target, ExportFormatKind::Kml, options)
        .export(&db)
        .unwrap();
    assert_eq!((summary.rows, summary.written()), (3, 2));

    let kml = std::fs::read_to_string(&summary.path).unwrap();
    // The sample without a location is left out.
    assert_eq!(kml.matches("<Placemark>").count(), 2);
    assert_eq!(kml.matches("<name>WIFI</name>").count(), 2);
    assert!(kml.contains("<coordinates>-73.6,45.5</coordinates>"));
}

#[test]
fn test_export_without_schema_fails() {
    let dir = TempDir::new().unwrap();
    // Not migrated: the samples table does not exist.
    let db = Database::open(&dir.path().join("empty.db")).unwrap();

    let err = FileExport::new(
        dir.path().join("out.csv"),
        ExportFormatKind::Csv,
        utc_options(),
    )
    .export(&db)
    .unwrap_err();

    assert!(matches!(err, netmon_core::Error::SourceUnavailable(_)));
    // Nothing was written through the format.
    let content = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert!(content.is_empty());
}
