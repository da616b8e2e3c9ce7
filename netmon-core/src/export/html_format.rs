//! HTML table export.

use super::ExportFormat;
use crate::error::Result;
use crate::format::escape_markup;
use std::io::Write;

const STYLE: &str = "table{border-collapse:collapse;font-family:sans-serif;font-size:12px}\
th,td{border:1px solid #999;padding:2px 6px;white-space:nowrap}\
th{background:#ddd}tr.odd td{background:#f4f4f4}";

/// A standalone document holding one `<table>`.
///
/// Rows alternate `even`/`odd` classes starting with `even` for row 0.
pub struct HtmlFormat<W: Write> {
    out: W,
}

impl<W: Write> HtmlFormat<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ExportFormat for HtmlFormat<W> {
    fn write_header(&mut self, column_names: &[String]) -> Result<()> {
        writeln!(self.out, "<!DOCTYPE html>")?;
        writeln!(self.out, "<html>")?;
        writeln!(
            self.out,
            "<head><meta charset=\"utf-8\"><title>Network Monitor</title><style>{}</style></head>",
            STYLE
        )?;
        writeln!(self.out, "<body>")?;
        writeln!(self.out, "<table>")?;
        write!(self.out, "<thead><tr>")?;
        for name in column_names {
            write!(self.out, "<th>{}</th>", escape_markup(name))?;
        }
        writeln!(self.out, "</tr></thead>")?;
        writeln!(self.out, "<tbody>")?;
        Ok(())
    }

    fn write_row(&mut self, row_number: usize, cell_values: &[String]) -> Result<()> {
        let class = if row_number % 2 == 0 { "even" } else { "odd" };
        write!(self.out, "<tr class=\"{}\">", class)?;
        for value in cell_values {
            write!(self.out, "<td>{}</td>", escape_markup(value))?;
        }
        writeln!(self.out, "</tr>")?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        writeln!(self.out, "</tbody>")?;
        writeln!(self.out, "</table>")?;
        writeln!(self.out, "</body>")?;
        writeln!(self.out, "</html>")?;
        self.out.flush()?;
        Ok(())
    }
}
