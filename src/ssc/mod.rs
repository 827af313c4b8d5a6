//! Seam to the SAM Simulation Core (SSC).
//!
//! [`SscApi`] mirrors the engine's generic data/module C API one call per
//! method. [`Data`] and [`Module`] own engine handles and release them when
//! dropped, so every exit path frees what it allocated.

pub mod native;
pub mod recording;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::params::{ParameterSet, Value};

pub use native::NativeSsc;
pub use recording::{ExecBehaviour, RecordingSsc};

/// Reported when a module fails without logging anything.
pub const NO_LOG_MESSAGES: &str = "no error messages logged";

/// Opaque engine data-object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataHandle(usize);

impl DataHandle {
    /// Wraps a raw engine handle value.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// Opaque engine module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(usize);

impl ModuleHandle {
    /// Wraps a raw engine handle value.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// Severity of a module log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Notice,
    Warning,
    Error,
}

/// One message logged by a compute module during execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Simulation time the message refers to, or negative if not timed.
    pub time: f32,
    pub message: String,
}

/// Low-level engine API.
///
/// Handle-freeing methods are infallible; callers normally go through
/// [`Data`] and [`Module`] rather than calling `*_free` directly.
pub trait SscApi {
    /// Engine version number.
    fn version(&self) -> i32;

    fn data_create(&self) -> Result<DataHandle>;
    fn data_free(&self, data: DataHandle);

    fn data_set_number(&self, data: DataHandle, name: &str, value: f64) -> Result<()>;
    fn data_set_array(&self, data: DataHandle, name: &str, values: &[f64]) -> Result<()>;
    /// Copies `table` into `data` under `name`; `table` stays owned by the caller.
    fn data_set_table(&self, data: DataHandle, name: &str, table: DataHandle) -> Result<()>;

    /// Reads an array variable, `None` if it does not exist.
    fn data_get_array(&self, data: DataHandle, name: &str) -> Result<Option<Vec<f64>>>;

    /// Creates a compute module, `None` if the engine has no such module.
    fn module_create(&self, name: &str) -> Result<Option<ModuleHandle>>;
    /// Runs a module; `false` means the run failed and its log says why.
    fn module_exec(&self, module: ModuleHandle, data: DataHandle) -> bool;
    /// Log entry `index` of the last run, `None` past the end.
    fn module_log(&self, module: ModuleHandle, index: usize) -> Option<LogEntry>;
    fn module_free(&self, module: ModuleHandle);
}

/// Scoped engine data object.
pub struct Data<'a, A: SscApi + ?Sized> {
    api: &'a A,
    handle: DataHandle,
}

impl<'a, A: SscApi + ?Sized> Data<'a, A> {
    /// Allocates an empty data object.
    pub fn create(api: &'a A) -> Result<Self> {
        let handle = api.data_create()?;
        trace!(handle = handle.as_raw(), "data object created");
        Ok(Self { api, handle })
    }

    pub fn handle(&self) -> DataHandle {
        self.handle
    }

    pub fn set_number(&self, name: &str, value: f64) -> Result<()> {
        self.api.data_set_number(self.handle, name, value)
    }

    pub fn set_array(&self, name: &str, values: &[f64]) -> Result<()> {
        self.api.data_set_array(self.handle, name, values)
    }

    /// Copies another data object in as a nested table.
    pub fn set_table(&self, name: &str, table: &Data<'_, A>) -> Result<()> {
        self.api.data_set_table(self.handle, name, table.handle)
    }

    /// Reads an array, failing with [`Error::MissingOutput`] if absent.
    pub fn get_array(&self, name: &str) -> Result<Vec<f64>> {
        self.api
            .data_get_array(self.handle, name)?
            .ok_or_else(|| Error::MissingOutput(name.to_string()))
    }
}

impl<A: SscApi + ?Sized> Drop for Data<'_, A> {
    fn drop(&mut self) {
        trace!(handle = self.handle.as_raw(), "data object freed");
        self.api.data_free(self.handle);
    }
}

/// Scoped compute module.
pub struct Module<'a, A: SscApi + ?Sized> {
    api: &'a A,
    handle: ModuleHandle,
    name: String,
}

impl<'a, A: SscApi + ?Sized> Module<'a, A> {
    /// Instantiates the named compute module.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownModule`] if the engine does not provide it.
    pub fn create(api: &'a A, name: &str) -> Result<Self> {
        let handle = api
            .module_create(name)?
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        Ok(Self {
            api,
            handle,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the module against `data`.
    ///
    /// # Errors
    ///
    /// [`Error::ModuleExec`] if the engine reports failure. It carries the
    /// module's error and warning messages, every message if only notices
    /// were logged, or [`NO_LOG_MESSAGES`] if the log is empty.
    pub fn exec(&self, data: &Data<'_, A>) -> Result<()> {
        if self.api.module_exec(self.handle, data.handle) {
            return Ok(());
        }
        let log = self.log();
        let mut messages: Vec<String> = log
            .iter()
            .filter(|entry| entry.level != LogLevel::Notice)
            .map(|entry| entry.message.clone())
            .collect();
        if messages.is_empty() {
            messages = log.into_iter().map(|entry| entry.message).collect();
        }
        if messages.is_empty() {
            messages.push(NO_LOG_MESSAGES.to_string());
        }
        Err(Error::ModuleExec {
            module: self.name.clone(),
            messages,
        })
    }

    /// All log entries of the last run.
    pub fn log(&self) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        while let Some(entry) = self.api.module_log(self.handle, entries.len()) {
            entries.push(entry);
        }
        entries
    }
}

impl<A: SscApi + ?Sized> Drop for Module<'_, A> {
    fn drop(&mut self) {
        self.api.module_free(self.handle);
    }
}

/// Pushes a parameter set into a new engine data object.
///
/// Nested tables are built in a temporary data object that is freed as soon
/// as the engine has copied it.
pub fn submit<'a, A: SscApi + ?Sized>(api: &'a A, params: &ParameterSet) -> Result<Data<'a, A>> {
    let data = Data::create(api)?;
    for (name, value) in params.iter() {
        match value {
            Value::Number(n) => data.set_number(name, *n)?,
            Value::Array(values) => {
                debug!(variable = name, len = values.len(), "set array");
                data.set_array(name, values)?;
            }
            Value::Table(table) => {
                let nested = submit(api, table)?;
                data.set_table(name, &nested)?;
            }
        }
    }
    Ok(data)
}
