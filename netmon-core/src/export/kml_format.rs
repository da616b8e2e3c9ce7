//! KML export: one placemark per sample that has a device location.

use super::ExportFormat;
use crate::columns;
use crate::error::{Error, Result};
use crate::format::escape_markup;
use std::io::Write;

/// Placemark styles, keyed by the name column's value.
const STYLES: &[(&str, &str)] = &[("pass", "ff00ff00"), ("fail", "ff0000ff"), ("other", "ff00ffff")];

/// Placemarks positioned by `device_longitude`/`device_latitude`.
///
/// Each placemark is named after the value of the configured export column
/// and carries every other column as `ExtendedData`. Rows without a
/// parseable location are skipped.
pub struct KmlFormat<W: Write> {
    out: W,
    name_column: String,
    columns: Vec<String>,
    name_index: usize,
    latitude_index: usize,
    longitude_index: usize,
    placemarks: usize,
    skipped: usize,
}

impl<W: Write> KmlFormat<W> {
    pub fn new(out: W, name_column: &str) -> Self {
        Self {
            out,
            name_column: name_column.to_string(),
            columns: Vec::new(),
            name_index: 0,
            latitude_index: 0,
            longitude_index: 0,
            placemarks: 0,
            skipped: 0,
        }
    }

    /// Placemarks written so far.
    pub fn placemarks(&self) -> usize {
        self.placemarks
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn index_of(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::Format(format!("KML export needs column {}", column)))
    }
}

/// Style for a placemark name.
fn style_for(value: &str) -> &'static str {
    match value.trim().to_ascii_uppercase().as_str() {
        "PASS" => "pass",
        "FAIL" => "fail",
        _ => "other",
    }
}

fn coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl<W: Write> ExportFormat for KmlFormat<W> {
    fn write_header(&mut self, column_names: &[String]) -> Result<()> {
        self.columns = column_names.to_vec();
        self.name_index = self.index_of(&self.name_column)?;
        self.latitude_index = self.index_of(columns::DEVICE_LATITUDE)?;
        self.longitude_index = self.index_of(columns::DEVICE_LONGITUDE)?;

        writeln!(self.out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(self.out, "<kml xmlns=\"http://www.opengis.net/kml/2.2\">")?;
        writeln!(self.out, "<Document>")?;
        writeln!(
            self.out,
            "<name>Network Monitor: {}</name>",
            escape_markup(&self.name_column)
        )?;
        for (id, color) in STYLES {
            writeln!(
                self.out,
                "<Style id=\"{}\"><IconStyle><color>{}</color></IconStyle></Style>",
                id, color
            )?;
        }
        Ok(())
    }

    fn write_row(&mut self, _row_number: usize, cell_values: &[String]) -> Result<()> {
        let cell = |i: usize| cell_values.get(i).map(String::as_str).unwrap_or("");
        let (Some(latitude), Some(longitude)) = (
            coordinate(cell(self.latitude_index)),
            coordinate(cell(self.longitude_index)),
        ) else {
            self.skipped += 1;
            return Ok(());
        };

        let name = cell(self.name_index);
        writeln!(self.out, "<Placemark>")?;
        writeln!(self.out, "<name>{}</name>", escape_markup(name))?;
        writeln!(self.out, "<styleUrl>#{}</styleUrl>", style_for(name))?;
        writeln!(self.out, "<ExtendedData>")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i == self.name_index || i == self.latitude_index || i == self.longitude_index {
                continue;
            }
            writeln!(
                self.out,
                "<Data name=\"{}\"><value>{}</value></Data>",
                escape_markup(column),
                escape_markup(cell(i))
            )?;
        }
        writeln!(self.out, "</ExtendedData>")?;
        writeln!(
            self.out,
            "<Point><coordinates>{},{}</coordinates></Point>",
            longitude, latitude
        )?;
        writeln!(self.out, "</Placemark>")?;
        self.placemarks += 1;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        writeln!(self.out, "</Document>")?;
        writeln!(self.out, "</kml>")?;
        self.out.flush()?;
        Ok(())
    }

    fn skipped_rows(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        ["timestamp", "socket_connection_test", "device_latitude", "device_longitude"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(values: [&str; 4]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_placemarks() {
        let mut format = KmlFormat::new(Vec::new(), "socket_connection_test");
        format.write_header(&header()).unwrap();
        format
            .write_row(0, &row(["2014-02-03 04:05:06", "PASS", "45.5", "-73.6"]))
            .unwrap();
        format
            .write_row(1, &row(["2014-02-03 04:05:16", "FAIL", "", ""]))
            .unwrap();
        format
            .write_row(2, &row(["2014-02-03 04:05:26", "FAIL", "45.6", "-73.5"]))
            .unwrap();
        format.write_footer().unwrap();
        assert_eq!(format.placemarks(), 2);
        assert_eq!(format.skipped_rows(), 1);

        let kml = String::from_utf8(format.into_inner()).unwrap();
        assert!(kml.starts_with("<?xml"));
        assert_eq!(kml.matches("<Placemark>").count(), 2);
        assert!(kml.contains("<name>PASS</name>\n<styleUrl>#pass</styleUrl>"));
        assert!(kml.contains("<name>FAIL</name>\n<styleUrl>#fail</styleUrl>"));
        assert!(kml.contains("<coordinates>-73.6,45.5</coordinates>"));
        assert!(kml.contains(
            "<Data name=\"timestamp\"><value>2014-02-03 04:05:06</value></Data>"
        ));
        assert!(!kml.contains("<Data name=\"device_latitude\">"));
        assert!(kml.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn test_missing_name_column() {
        let mut format = KmlFormat::new(Vec::new(), "wifi_ssid");
        let err = format.write_header(&header()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_style_for() {
        assert_eq!(style_for(" pass "), "pass");
        assert_eq!(style_for("FAIL"), "fail");
        assert_eq!(style_for(""), "other");
    }
}
