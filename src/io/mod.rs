//! Weather table import and export.

pub mod export;
pub mod read;

pub use export::{export_csv, write_csv};
pub use read::{read_nsrdb_csv, read_weather_csv};
