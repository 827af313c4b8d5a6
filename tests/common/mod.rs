//! Shared test fixtures for integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use ssc_pvwatts::params::{ParameterSet, SOLAR_RESOURCE_DATA};
use ssc_pvwatts::ssc::RecordingSsc;
use ssc_pvwatts::weather::{DHI, DNI, TEMPERATURE, WIND_SPEED, WeatherTable};

/// Hourly index starting 2015-06-30 00:00.
pub fn hourly_index(n: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2015, 6, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start");
    (0..n)
        .map(|h| start + chrono::Duration::hours(h as i64))
        .collect()
}

/// One synthetic day with a half-sine irradiance bump between 06:00 and 18:00,
/// plus an unrelated `GHI` column that the pipeline must leave alone.
pub fn sunny_day() -> WeatherTable {
    let mut table = WeatherTable::new(hourly_index(24));
    let sun: Vec<f64> = (0..24)
        .map(|h| {
            if (6..18).contains(&h) {
                (std::f64::consts::PI * (h as f64 - 6.0) / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect();
    let insert = |t: &mut WeatherTable, name: &str, values: Vec<f64>| {
        t.insert_column(name, values).expect("aligned column");
    };
    insert(&mut table, "GHI", sun.iter().map(|s| 1000.0 * s).collect());
    insert(&mut table, DNI, sun.iter().map(|s| 850.0 * s).collect());
    insert(&mut table, DHI, sun.iter().map(|s| 120.0 * s).collect());
    insert(&mut table, WIND_SPEED, vec![2.0; 24]);
    insert(&mut table, TEMPERATURE, (0..24).map(|h| 18.0 + h as f64 / 4.0).collect());
    table
}

/// Stand-in AC model: 4 W per W/m² of beam irradiance.
pub fn beam_model(inputs: &ParameterSet) -> Vec<f64> {
    inputs
        .table(SOLAR_RESOURCE_DATA)
        .and_then(|t| t.array("dn"))
        .map(|dn| dn.iter().map(|v| 4.0 * v).collect())
        .unwrap_or_default()
}

/// Recording engine running [`beam_model`] as `pvwattsv5`.
pub fn engine() -> RecordingSsc {
    RecordingSsc::pvwatts(beam_model)
}
