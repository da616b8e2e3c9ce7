//! Comma-separated values export.

use super::ExportFormat;
use crate::error::Result;
use std::io::Write;

/// One header record, then one record per row.
pub struct CsvFormat<W: Write> {
    writer: ::csv::Writer<W>,
}

impl<W: Write> CsvFormat<W> {
    pub fn new(out: W) -> Self {
        let writer = ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(out);
        Self { writer }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> ExportFormat for CsvFormat<W> {
    fn write_header(&mut self, column_names: &[String]) -> Result<()> {
        self.writer.write_record(column_names)?;
        Ok(())
    }

    fn write_row(&mut self, _row_number: usize, cell_values: &[String]) -> Result<()> {
        self.writer.write_record(cell_values)?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
