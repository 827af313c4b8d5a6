//! PV system configuration passed to the `pvwattsv5` module.

use serde::{Deserialize, Serialize};

/// Mounting of the array, encoded as the engine's `array_type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayType {
    /// Fixed open rack.
    #[default]
    Fixed,
    /// Fixed, roof mounted.
    FixedRoof,
    /// Single-axis tracker.
    OneAxis,
    /// Single-axis tracker with backtracking.
    Backtracked,
    /// Two-axis tracker.
    TwoAxis,
}

impl ArrayType {
    /// Numeric code the engine expects.
    pub fn code(self) -> f64 {
        match self {
            Self::Fixed => 0.0,
            Self::FixedRoof => 1.0,
            Self::OneAxis => 2.0,
            Self::Backtracked => 3.0,
            Self::TwoAxis => 4.0,
        }
    }
}

/// System design parameters.
///
/// The defaults are the reference plant every run is simulated with unless a
/// configuration file says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvSystem {
    /// Nameplate DC capacity (kW).
    pub system_capacity: f64,
    /// DC to AC ratio.
    pub dc_ac_ratio: f64,
    /// Array tilt from horizontal (degrees).
    pub tilt: f64,
    /// Array azimuth clockwise from north (degrees).
    pub azimuth: f64,
    /// Inverter efficiency at rated power (percent).
    pub inv_eff: f64,
    /// Total system losses (percent).
    pub losses: f64,
    pub array_type: ArrayType,
    /// Ground coverage ratio, only used by trackers.
    pub gcr: f64,
    /// Constant loss adjustment (percent).
    pub adjust_constant: f64,
}

impl Default for PvSystem {
    fn default() -> Self {
        Self {
            system_capacity: 4.0,
            dc_ac_ratio: 1.1,
            tilt: 25.0,
            azimuth: 180.0,
            inv_eff: 96.0,
            losses: 14.0757,
            array_type: ArrayType::Fixed,
            gcr: 0.4,
            adjust_constant: 0.0,
        }
    }
}

impl PvSystem {
    /// Engine variable names and values, in submission order.
    pub fn scalars(&self) -> [(&'static str, f64); 9] {
        [
            ("system_capacity", self.system_capacity),
            ("dc_ac_ratio", self.dc_ac_ratio),
            ("tilt", self.tilt),
            ("azimuth", self.azimuth),
            ("inv_eff", self.inv_eff),
            ("losses", self.losses),
            ("array_type", self.array_type.code()),
            ("gcr", self.gcr),
            ("adjust:constant", self.adjust_constant),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scalars_match_reference_plant() {
        let scalars = PvSystem::default().scalars();
        assert_eq!(
            scalars,
            [
                ("system_capacity", 4.0),
                ("dc_ac_ratio", 1.1),
                ("tilt", 25.0),
                ("azimuth", 180.0),
                ("inv_eff", 96.0),
                ("losses", 14.0757),
                ("array_type", 0.0),
                ("gcr", 0.4),
                ("adjust:constant", 0.0),
            ]
        );
    }

    #[test]
    fn array_type_codes() {
        assert_eq!(ArrayType::FixedRoof.code(), 1.0);
        assert_eq!(ArrayType::OneAxis.code(), 2.0);
        assert_eq!(ArrayType::Backtracked.code(), 3.0);
        assert_eq!(ArrayType::TwoAxis.code(), 4.0);
    }
}
