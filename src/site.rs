//! Site metadata submitted with the solar resource.

use serde::{Deserialize, Serialize};

/// Location of the plant.
///
/// Defaults place the site in the Costa Rican central valley at sea level
/// with a UTC+1 clock offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Site {
    /// Latitude in decimal degrees, north positive.
    pub lat: f64,
    /// Longitude in decimal degrees, east positive.
    pub lon: f64,
    /// Offset of the weather timestamps from UTC, in hours.
    pub timezone: f64,
    /// Elevation above sea level in metres.
    pub elevation: f64,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            lat: 9.817934,
            lon: -84.070552,
            timezone: 1.0,
            elevation: 0.0,
        }
    }
}
