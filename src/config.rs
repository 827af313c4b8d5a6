//! TOML run configuration: engine location, site, and system design.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::site::Site;
use crate::system::PvSystem;

/// Top-level run configuration parsed from TOML.
///
/// Every section is optional and falls back to [`RunConfig::default`], which
/// reproduces the reference plant at the default site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Where to find the simulation engine.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Plant location.
    #[serde(default)]
    pub site: Site,
    /// PV system design.
    #[serde(default)]
    pub system: PvSystem,
}

/// Engine location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Path to the SSC shared library. Unset means `SSC_LIBRARY` or the
    /// loader's search path.
    pub library_path: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"system.tilt"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl RunConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field: field.into(),
                    message: message.into(),
                });
            }
        };

        let site = &self.site;
        check(
            (-90.0..=90.0).contains(&site.lat),
            "site.lat",
            "must be in [-90, 90]",
        );
        check(
            (-180.0..=180.0).contains(&site.lon),
            "site.lon",
            "must be in [-180, 180]",
        );
        check(
            (-12.0..=14.0).contains(&site.timezone),
            "site.timezone",
            "must be in [-12, 14]",
        );
        check(site.elevation.is_finite(), "site.elevation", "must be finite");

        let sys = &self.system;
        check(sys.system_capacity > 0.0, "system.system_capacity", "must be > 0");
        check(sys.dc_ac_ratio > 0.0, "system.dc_ac_ratio", "must be > 0");
        check(
            (0.0..=90.0).contains(&sys.tilt),
            "system.tilt",
            "must be in [0, 90]",
        );
        check(
            (0.0..360.0).contains(&sys.azimuth),
            "system.azimuth",
            "must be in [0, 360)",
        );
        check(
            sys.inv_eff > 0.0 && sys.inv_eff <= 100.0,
            "system.inv_eff",
            "must be in (0, 100]",
        );
        check(
            (-5.0..=99.0).contains(&sys.losses),
            "system.losses",
            "must be in [-5, 99]",
        );
        check(
            sys.gcr > 0.0 && sys.gcr < 1.0,
            "system.gcr",
            "must be in (0, 1)",
        );
        check(
            sys.adjust_constant.is_finite(),
            "system.adjust_constant",
            "must be finite",
        );

        errors
    }
}
