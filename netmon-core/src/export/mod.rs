//! Export recorded samples to a file
//!
//! [`FileExport`] pulls every row from a [`TabularSource`] ordered by
//! timestamp, drops the identifier column, renders each cell to text and
//! hands header, rows and footer to an [`ExportFormat`].
//!
//! ```rust,no_run
//! use netmon_core::export::{ExportFormatKind, ExportOptions, FileExport};
//! use netmon_core::Database;
//!
//! let db = Database::open(std::path::Path::new("netmon.db")).unwrap();
//! let summary = FileExport::new("netmon.csv", ExportFormatKind::Csv, ExportOptions::default())
//!     .export(&db)
//!     .unwrap();
//! println!("{} rows in {}", summary.written(), summary.path.display());
//! ```

mod csv_format;
mod html_format;
mod kml_format;

pub use csv_format::CsvFormat;
pub use html_format::HtmlFormat;
pub use kml_format::KmlFormat;

use crate::columns;
use crate::config::TimeZoneMode;
use crate::error::{Error, Result};
use crate::format::render_cell;
use crate::source::{RowVisitor, TabularSource};
use crate::types::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes one output format.
///
/// Calls always arrive as one `write_header`, zero or more `write_row`, then
/// one `write_footer`. Any error stops the export.
pub trait ExportFormat {
    /// Prepare the output and write the header with the column names.
    fn write_header(&mut self, column_names: &[String]) -> Result<()>;

    /// Write a single row. `row_number` starts at 0.
    fn write_row(&mut self, row_number: usize, cell_values: &[String]) -> Result<()>;

    /// Write the footer, if any, and flush.
    fn write_footer(&mut self) -> Result<()>;

    /// Rows received but left out of the output.
    fn skipped_rows(&self) -> usize {
        0
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormatKind {
    /// Comma-separated values
    Csv,
    /// Standalone HTML table
    Html,
    /// Placemarks positioned by the device coordinates
    Kml,
}

impl ExportFormatKind {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormatKind::Csv => "csv",
            ExportFormatKind::Html => "html",
            ExportFormatKind::Kml => "kml",
        }
    }

    /// Build the writer for this format over `out`.
    pub fn create<W: Write + 'static>(
        &self,
        out: W,
        options: &ExportOptions,
    ) -> Box<dyn ExportFormat> {
        match self {
            ExportFormatKind::Csv => Box::new(CsvFormat::new(out)),
            ExportFormatKind::Html => Box::new(HtmlFormat::new(out)),
            ExportFormatKind::Kml => Box::new(KmlFormat::new(out, &options.kml_column)),
        }
    }
}

impl std::str::FromStr for ExportFormatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormatKind::Csv),
            "html" => Ok(ExportFormatKind::Html),
            "kml" => Ok(ExportFormatKind::Kml),
            other => Err(Error::Format(format!("unsupported export format: {}", other))),
        }
    }
}

/// Settings that affect how cells are rendered.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Zone used for the timestamp column
    pub timezone: TimeZoneMode,
    /// Column whose value names each KML placemark
    pub kml_column: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            timezone: TimeZoneMode::default(),
            kml_column: columns::SOCKET_CONNECTION_TEST.to_string(),
        }
    }
}

/// Drives an [`ExportFormat`] from a source scan.
struct RowPump<'f, 'p> {
    format: &'f mut dyn ExportFormat,
    timezone: TimeZoneMode,
    width: usize,
    rows: usize,
    progress: Option<&'f mut (dyn FnMut(usize) + 'p)>,
    values: Vec<String>,
}

impl RowVisitor for RowPump<'_, '_> {
    fn columns(&mut self, names: &[String]) -> Result<()> {
        // The first column is the row id.
        let used = names.get(1..).unwrap_or_default();
        self.width = used.len();
        self.format.write_header(used)
    }

    fn row(&mut self, cells: &[Cell]) -> Result<()> {
        self.values.clear();
        self.values.extend(
            cells
                .iter()
                .skip(1)
                .take(self.width)
                .map(|cell| render_cell(cell, self.timezone)),
        );
        self.format.write_row(self.rows, &self.values)?;
        self.rows += 1;
        if let Some(progress) = self.progress.as_deref_mut() {
            progress(self.rows);
        }
        Ok(())
    }
}

/// Stream `source` through `format`, returning the number of rows written.
///
/// The footer is written only after every row succeeded.
pub fn write_table<'p>(
    source: &dyn TabularSource,
    format: &mut dyn ExportFormat,
    timezone: TimeZoneMode,
    progress: Option<&mut (dyn FnMut(usize) + 'p)>,
) -> Result<usize> {
    let mut pump = RowPump {
        format,
        timezone,
        width: 0,
        rows: 0,
        progress,
        values: Vec::new(),
    };
    source.scan(&mut pump)?;
    pump.format.write_footer()?;
    Ok(pump.rows)
}

/// Outcome of a [`FileExport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Rows read from the source
    pub rows: usize,
    /// Rows the format left out, such as KML rows without a location
    pub skipped: usize,
}

impl ExportSummary {
    /// Rows that made it into the file.
    pub fn written(&self) -> usize {
        self.rows.saturating_sub(self.skipped)
    }
}

/// Export the recorded data to a file.
pub struct FileExport<'p> {
    path: PathBuf,
    kind: ExportFormatKind,
    options: ExportOptions,
    progress: Option<Box<dyn FnMut(usize) + 'p>>,
}

impl<'p> FileExport<'p> {
    pub fn new(path: impl Into<PathBuf>, kind: ExportFormatKind, options: ExportOptions) -> Self {
        Self {
            path: path.into(),
            kind,
            options,
            progress: None,
        }
    }

    /// Call `f` with the running row count after each row.
    pub fn with_progress(mut self, f: impl FnMut(usize) + 'p) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Write the export file, overwriting any existing one.
    ///
    /// Failures are logged; a partially written file is left in place.
    pub fn export(mut self, source: &dyn TabularSource) -> Result<ExportSummary> {
        tracing::debug!(path = %self.path.display(), format = ?self.kind, "export");

        match self.run(source) {
            Ok((rows, skipped)) => {
                tracing::info!(path = %self.path.display(), rows, skipped, "Export complete");
                Ok(ExportSummary {
                    path: self.path,
                    rows,
                    skipped,
                })
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not export file"
                );
                Err(e)
            }
        }
    }

    fn run(&mut self, source: &dyn TabularSource) -> Result<(usize, usize)> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let mut format = self.kind.create(BufWriter::new(file), &self.options);

        let rows = write_table(
            source,
            format.as_mut(),
            self.options.timezone,
            self.progress.as_deref_mut(),
        )?;
        Ok((rows, format.skipped_rows()))
    }
}
