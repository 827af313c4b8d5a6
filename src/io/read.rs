//! CSV import of weather tables.
//!
//! Two layouts are accepted: a leading timestamp column, or separate
//! `Year, Month, Day, Hour[, Minute]` columns as found in NSRDB and TMY
//! downloads. NSRDB files additionally carry two lines of site metadata
//! above the header, handled by [`read_nsrdb_csv`].

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::site::Site;
use crate::weather::WeatherTable;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const CALENDAR_COLUMNS: [&str; 5] = ["Year", "Month", "Day", "Hour", "Minute"];

/// Typical row count of an hourly year.
const LIKELY_ROW_COUNT: usize = 8760;

/// Parses a timestamp cell. Offsets (`+01:00`) are dropped, keeping the
/// local wall-clock time.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_local());
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

enum IndexLayout {
    /// Column 0 holds timestamps.
    Timestamp,
    /// Positions of Year, Month, Day, Hour and optional Minute.
    Calendar([Option<usize>; 5]),
}

fn detect_layout(headers: &csv::StringRecord) -> IndexLayout {
    let mut positions = [None; 5];
    for (slot, name) in positions.iter_mut().zip(CALENDAR_COLUMNS) {
        *slot = headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    }
    if positions[..4].iter().all(Option::is_some) {
        IndexLayout::Calendar(positions)
    } else {
        IndexLayout::Timestamp
    }
}

fn parse_number(record: &csv::StringRecord, i: usize, column: &str, line: u64) -> Result<f64> {
    let raw = record.get(i).unwrap_or("");
    raw.trim().parse().map_err(|_| Error::Parse {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Parses a calendar cell; only non-negative whole numbers are accepted.
fn calendar_field(record: &csv::StringRecord, i: usize, column: &str, line: u64) -> Result<u32> {
    let value = parse_number(record, i, column, line)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        return Ok(value as u32);
    }
    Err(Error::Parse {
        line,
        column: column.to_string(),
        value: record.get(i).unwrap_or("").to_string(),
    })
}

fn calendar_timestamp(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    positions: &[Option<usize>; 5],
    line: u64,
) -> Result<NaiveDateTime> {
    let mut parts = [0u32; 5];
    for (part, pos) in parts.iter_mut().zip(positions) {
        if let Some(i) = *pos {
            *part = calendar_field(record, i, &headers[i], line)?;
        }
    }
    let [year, month, day, hour, minute] = parts;
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| Error::Timestamp {
            line,
            value: format!("{year}-{month}-{day} {hour}:{minute}"),
        })
}

fn read_table<R: Read>(reader: R, line_offset: u64) -> Result<WeatherTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let layout = detect_layout(&headers);

    let value_columns: Vec<usize> = match &layout {
        IndexLayout::Timestamp => (1..headers.len()).collect(),
        IndexLayout::Calendar(positions) => (0..headers.len())
            .filter(|i| !positions.contains(&Some(*i)))
            .collect(),
    };

    let mut seen = HashSet::with_capacity(value_columns.len());
    for &i in &value_columns {
        if !seen.insert(&headers[i]) {
            return Err(Error::DuplicateColumn(headers[i].to_string()));
        }
    }

    let mut index = Vec::with_capacity(LIKELY_ROW_COUNT);
    let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(LIKELY_ROW_COUNT); value_columns.len()];

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line) + line_offset;

        let t = match &layout {
            IndexLayout::Timestamp => {
                let cell = record.get(0).unwrap_or("");
                parse_timestamp(cell).ok_or_else(|| Error::Timestamp {
                    line,
                    value: cell.to_string(),
                })?
            }
            IndexLayout::Calendar(positions) => {
                calendar_timestamp(&record, &headers, positions, line)?
            }
        };
        index.push(t);

        for (column, &i) in values.iter_mut().zip(&value_columns) {
            column.push(parse_number(&record, i, &headers[i], line)?);
        }
    }

    let mut table = WeatherTable::new(index);
    for (column, &i) in values.into_iter().zip(&value_columns) {
        table.insert_column(&headers[i], column)?;
    }
    debug!(
        rows = table.len(),
        columns = value_columns.len(),
        "weather table read"
    );
    Ok(table)
}

/// Reads a weather table with a header row.
///
/// # Errors
///
/// Returns an error for malformed CSV, unparseable timestamps or calendar
/// fields, and non-numeric data cells.
pub fn read_weather_csv<R: Read>(reader: R) -> Result<WeatherTable> {
    read_table(reader, 0)
}

/// Reads an NSRDB download: a metadata header line, a metadata value line,
/// then the data table.
///
/// Returns the table and the site described by the metadata. `Latitude` and
/// `Longitude` are required; `Time Zone` and `Elevation` fall back to the
/// [`Site`] defaults.
///
/// # Errors
///
/// [`Error::MissingColumn`] if a required metadata field is absent, plus
/// everything [`read_weather_csv`] reports.
pub fn read_nsrdb_csv<R: Read>(reader: R) -> Result<(WeatherTable, Site)> {
    let mut reader = BufReader::new(reader);
    let mut names = String::new();
    let mut fields = String::new();
    reader.read_line(&mut names)?;
    reader.read_line(&mut fields)?;

    let names = single_record(&names)?;
    let fields = single_record(&fields)?;
    let lookup = |key: &str| -> Result<Option<f64>> {
        match names.iter().position(|n| n.eq_ignore_ascii_case(key)) {
            Some(i) => parse_number(&fields, i, key, 2).map(Some),
            None => Ok(None),
        }
    };

    let defaults = Site::default();
    let site = Site {
        lat: lookup("Latitude")?.ok_or_else(|| Error::MissingColumn("Latitude".to_string()))?,
        lon: lookup("Longitude")?.ok_or_else(|| Error::MissingColumn("Longitude".to_string()))?,
        timezone: lookup("Time Zone")?.unwrap_or(defaults.timezone),
        elevation: lookup("Elevation")?.unwrap_or(defaults.elevation),
    };

    let table = read_table(reader, 2)?;
    Ok((table, site))
}

fn single_record(line: &str) -> Result<csv::StringRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(line.as_bytes());
    Ok(rdr.records().next().transpose()?.unwrap_or_default())
}
