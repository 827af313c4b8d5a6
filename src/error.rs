//! Crate-wide error type.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Everything that can go wrong between reading a weather table and
/// appending the generation column.
#[derive(Debug, Error)]
pub enum Error {
    /// A column the engine needs is not in the table.
    #[error("missing required column \"{0}\"")]
    MissingColumn(String),

    /// A column does not line up with the timestamp index.
    #[error("column \"{column}\" has {actual} values, index has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two input columns share a header.
    #[error("column \"{0}\" appears more than once")]
    DuplicateColumn(String),

    #[error("weather table has no rows")]
    EmptyTable,

    /// The SSC shared library could not be opened.
    #[error("cannot load SSC library \"{path}\": {source}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// The SSC shared library lacks an expected entry point.
    #[error("SSC library has no symbol \"{name}\": {source}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// An engine allocation returned a null handle.
    #[error("engine returned a null handle from {0}")]
    NullHandle(&'static str),

    /// A handle the engine does not know, e.g. one already freed.
    #[error("unknown or freed engine handle {0:#x}")]
    InvalidHandle(usize),

    /// Variable or module names are passed as C strings.
    #[error("name \"{0}\" contains an interior NUL byte")]
    InvalidName(String),

    /// An array is longer than the engine's `int` length field.
    #[error("array \"{name}\" has {len} values, more than the engine accepts")]
    ArrayTooLong { name: String, len: usize },

    #[error("engine has no compute module \"{0}\"")]
    UnknownModule(String),

    /// The compute module reported failure; `messages` is its log.
    #[error("compute module \"{module}\" failed: {}", .messages.join("; "))]
    ModuleExec {
        module: String,
        messages: Vec<String>,
    },

    #[error("engine produced no output array \"{0}\"")]
    MissingOutput(String),

    /// The output array does not have one value per input row.
    #[error("output \"{name}\" has {actual} values, table has {expected} rows")]
    OutputLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A timestamp cell could not be parsed.
    #[error("line {line}: cannot parse timestamp \"{value}\"")]
    Timestamp { line: u64, value: String },

    /// A numeric cell could not be parsed.
    #[error("line {line}, column \"{column}\": cannot parse \"{value}\" as a number")]
    Parse {
        line: u64,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
