//! Photovoltaic generation for weather time series via the SAM Simulation
//! Core (SSC) `pvwattsv5` module.

pub mod adapter;
pub mod config;
pub mod error;
/// Weather table CSV import and export.
pub mod io;
pub mod params;
pub mod site;
/// Engine API seam and backends.
pub mod ssc;
pub mod system;
pub mod telemetry;
pub mod weather;

pub use adapter::call_ssc_with_table;
pub use error::{Error, Result};
