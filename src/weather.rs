//! In-memory weather table: a timestamp index plus named numeric columns.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Direct-normal irradiance column (W/m²).
pub const DNI: &str = "DNI";
/// Diffuse-horizontal irradiance column (W/m²).
pub const DHI: &str = "DHI";
/// Wind speed column (m/s).
pub const WIND_SPEED: &str = "Wind Speed";
/// Dry-bulb temperature column (°C).
pub const TEMPERATURE: &str = "Temperature";
/// Column appended with the engine's AC output.
pub const GENERATION: &str = "generation";

/// Columns the engine needs, in submission order.
pub const REQUIRED_COLUMNS: [&str; 4] = [DNI, DHI, WIND_SPEED, TEMPERATURE];

/// A time-indexed table of `f64` columns.
///
/// Every column holds exactly one value per index entry; [`insert_column`]
/// rejects anything else. Column order is insertion order.
///
/// [`insert_column`]: WeatherTable::insert_column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<f64>)>,
}

impl WeatherTable {
    /// Creates a table with the given index and no columns.
    pub fn new(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The timestamp index.
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates `(name, values)` pairs in table order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Looks up a column, failing with [`Error::MissingColumn`].
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Adds a column, or replaces the values of an existing one in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnLength`] if `values` is not index-aligned.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(Error::ColumnLength {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Checks that the table can be handed to the engine.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyTable`] for a table without rows, otherwise
    /// [`Error::MissingColumn`] for the first required column that is absent.
    pub fn validate_required(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::EmptyTable);
        }
        for name in REQUIRED_COLUMNS {
            self.require(name)?;
        }
        Ok(())
    }

    /// Calendar years of the index, as engine numbers.
    pub fn years(&self) -> Vec<f64> {
        self.index.iter().map(|t| f64::from(t.year())).collect()
    }

    pub fn months(&self) -> Vec<f64> {
        self.index.iter().map(|t| f64::from(t.month())).collect()
    }

    pub fn days(&self) -> Vec<f64> {
        self.index.iter().map(|t| f64::from(t.day())).collect()
    }

    pub fn hours(&self) -> Vec<f64> {
        self.index.iter().map(|t| f64::from(t.hour())).collect()
    }

    pub fn minutes(&self) -> Vec<f64> {
        self.index.iter().map(|t| f64::from(t.minute())).collect()
    }
}
