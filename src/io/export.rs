//! CSV export of weather tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::weather::WeatherTable;

/// Header of the index column.
pub const TIMESTAMP_HEADER: &str = "timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports a table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_csv(table: &WeatherTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(table, buf)
}

/// Writes a table as CSV to any writer.
///
/// The first column is the timestamp index, followed by every column in
/// table order. Values use the shortest representation that parses back to
/// the same `f64`, so output is deterministic and lossless.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv(table: &WeatherTable, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec![TIMESTAMP_HEADER];
    header.extend(table.column_names());
    wtr.write_record(&header)?;

    let columns: Vec<&[f64]> = table.columns().map(|(_, values)| values).collect();
    for (row, t) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(t.format(TIMESTAMP_FORMAT).to_string());
        record.extend(columns.iter().map(|c| c[row].to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read::read_weather_csv;
    use chrono::NaiveDate;

    fn table() -> WeatherTable {
        let start = NaiveDate::from_ymd_opt(2015, 6, 30)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid start");
        let index = (0..3)
            .map(|h| start + chrono::Duration::hours(h))
            .collect();
        let mut t = WeatherTable::new(index);
        t.insert_column("DNI", vec![800.0, 812.5, 0.1]).expect("aligned");
        t.insert_column("generation", vec![3.25, 3.3, 0.0])
            .expect("aligned");
        t
    }

    #[test]
    fn header_and_rows() {
        let mut buf = Vec::new();
        write_csv(&table(), &mut buf).expect("write");
        let out = String::from_utf8(buf).expect("utf-8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,DNI,generation");
        assert_eq!(lines[1], "2015-06-30 12:00:00,800,3.25");
        assert_eq!(lines[2], "2015-06-30 13:00:00,812.5,3.3");
    }

    #[test]
    fn output_reads_back_identically() {
        let original = table();
        let mut buf = Vec::new();
        write_csv(&original, &mut buf).expect("write");
        let parsed = read_weather_csv(buf.as_slice()).expect("read back");
        assert_eq!(parsed, original);
    }

    #[test]
    fn deterministic_output() {
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&table(), &mut buf1).ok();
        write_csv(&table(), &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
