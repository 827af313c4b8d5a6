//! Engine-independent description of everything submitted to SSC.
//!
//! Building the parameter set is pure; [`crate::ssc::submit`] pushes it into
//! an engine data object.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::site::Site;
use crate::system::PvSystem;
use crate::weather::{DHI, DNI, TEMPERATURE, WIND_SPEED, WeatherTable};

/// Key under which the resource table is nested in the simulation context.
pub const SOLAR_RESOURCE_DATA: &str = "solar_resource_data";

/// One engine variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Array(Vec<f64>),
    Table(ParameterSet),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Array(values) => values.serialize(serializer),
            Value::Table(table) => table.serialize(serializer),
        }
    }
}

/// Ordered set of named engine variables.
///
/// Setting an existing name replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Value)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn set_number(&mut self, name: impl Into<String>, value: f64) {
        self.set(name, Value::Number(value));
    }

    pub fn set_array(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.set(name, Value::Array(values));
    }

    pub fn set_table(&mut self, name: impl Into<String>, table: ParameterSet) {
        self.set(name, Value::Table(table));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn array(&self, name: &str) -> Option<&[f64]> {
        match self.get(name)? {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn table(&self, name: &str) -> Option<&ParameterSet> {
        match self.get(name)? {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Variable names in submission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Builds the solar resource table: site scalars, calendar arrays taken from
/// the index, and the four weather columns.
///
/// # Errors
///
/// Fails if the table is empty or a required column is missing.
pub fn resource_data(table: &WeatherTable, site: &Site) -> Result<ParameterSet> {
    table.validate_required()?;

    let mut wfd = ParameterSet::new();
    wfd.set_number("lat", site.lat);
    wfd.set_number("lon", site.lon);
    wfd.set_number("tz", site.timezone);
    wfd.set_number("elev", site.elevation);
    wfd.set_array("year", table.years());
    wfd.set_array("month", table.months());
    wfd.set_array("day", table.days());
    wfd.set_array("hour", table.hours());
    wfd.set_array("minute", table.minutes());
    wfd.set_array("dn", table.require(DNI)?.to_vec());
    wfd.set_array("df", table.require(DHI)?.to_vec());
    wfd.set_array("wspd", table.require(WIND_SPEED)?.to_vec());
    wfd.set_array("tdry", table.require(TEMPERATURE)?.to_vec());
    Ok(wfd)
}

/// Builds the full simulation context: the nested resource table followed by
/// the system scalars.
///
/// # Errors
///
/// Same as [`resource_data`].
pub fn simulation_inputs(
    table: &WeatherTable,
    site: &Site,
    system: &PvSystem,
) -> Result<ParameterSet> {
    let mut dat = ParameterSet::new();
    dat.set_table(SOLAR_RESOURCE_DATA, resource_data(table, site)?);
    for (name, value) in system.scalars() {
        dat.set_number(name, value);
    }
    Ok(dat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::weather::REQUIRED_COLUMNS;
    use chrono::{NaiveDate, NaiveDateTime};

    fn table(n: usize) -> WeatherTable {
        let start: NaiveDateTime = NaiveDate::from_ymd_opt(2010, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid start");
        let index = (0..n)
            .map(|i| start + chrono::Duration::minutes(30 * i as i64))
            .collect();
        let mut table = WeatherTable::new(index);
        for (k, name) in REQUIRED_COLUMNS.iter().enumerate() {
            let values = (0..n).map(|i| (k * 1000 + i) as f64).collect();
            table.insert_column(*name, values).expect("aligned");
        }
        table
    }

    #[test]
    fn resource_data_has_exact_fields_and_lengths() {
        let t = table(48);
        let wfd = resource_data(&t, &Site::default()).expect("valid table");
        let names: Vec<&str> = wfd.names().collect();
        assert_eq!(
            names,
            [
                "lat", "lon", "tz", "elev", "year", "month", "day", "hour", "minute", "dn", "df",
                "wspd", "tdry"
            ]
        );
        for name in &names[4..] {
            assert_eq!(wfd.array(name).map(<[f64]>::len), Some(48), "{name}");
        }
        assert_eq!(wfd.number("lat"), Some(9.817934));
        assert_eq!(wfd.array("minute").map(|m| m[1]), Some(30.0));
        assert_eq!(wfd.array("tdry").map(|v| v[5]), Some(3005.0));
    }

    #[test]
    fn simulation_inputs_nest_resource_then_system() {
        let t = table(3);
        let dat = simulation_inputs(&t, &Site::default(), &PvSystem::default()).expect("valid");
        let names: Vec<&str> = dat.names().collect();
        assert_eq!(names[0], SOLAR_RESOURCE_DATA);
        assert_eq!(names.len(), 10);
        assert!(dat.table(SOLAR_RESOURCE_DATA).is_some());
        assert_eq!(dat.number("adjust:constant"), Some(0.0));
        assert_eq!(dat.number("losses"), Some(14.0757));
    }

    #[test]
    fn identical_inputs_give_identical_parameters() {
        let t = table(10);
        let a = simulation_inputs(&t, &Site::default(), &PvSystem::default()).ok();
        let b = simulation_inputs(&t, &Site::default(), &PvSystem::default()).ok();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn missing_column_is_reported() {
        let mut t = WeatherTable::new(table(2).index().to_vec());
        t.insert_column(DNI, vec![0.0, 0.0]).expect("aligned");
        let err = resource_data(&t, &Site::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == DHI));
    }

    #[test]
    fn set_replaces_without_reordering() {
        let mut p = ParameterSet::new();
        p.set_number("a", 1.0);
        p.set_number("b", 2.0);
        p.set_array("a", vec![3.0]);
        assert_eq!(p.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(p.array("a"), Some(&[3.0][..]));
        assert_eq!(p.number("a"), None);
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let mut inner = ParameterSet::new();
        inner.set_array("dn", vec![1.0, 2.0]);
        let mut p = ParameterSet::new();
        p.set_table("res", inner);
        p.set_number("tilt", 25.0);
        let json = serde_json::to_string(&p).expect("serializable");
        assert_eq!(json, r#"{"res":{"dn":[1.0,2.0]},"tilt":25.0}"#);
    }
}
