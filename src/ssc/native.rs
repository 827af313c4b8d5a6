//! SSC backend that loads the engine's shared library at runtime.

use std::env;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::info;

use super::{DataHandle, LogEntry, LogLevel, ModuleHandle, SscApi};
use crate::error::{Error, Result};

/// Environment variable overriding the library location.
pub const LIBRARY_ENV: &str = "SSC_LIBRARY";

/// The engine's `ssc_number_t`.
type SscNumber = f32;

type VersionFn = unsafe extern "C" fn() -> c_int;
type DataCreateFn = unsafe extern "C" fn() -> *mut c_void;
type DataFreeFn = unsafe extern "C" fn(*mut c_void);
type SetNumberFn = unsafe extern "C" fn(*mut c_void, *const c_char, SscNumber);
type SetArrayFn = unsafe extern "C" fn(*mut c_void, *const c_char, *const SscNumber, c_int);
type SetTableFn = unsafe extern "C" fn(*mut c_void, *const c_char, *mut c_void);
type GetArrayFn = unsafe extern "C" fn(*mut c_void, *const c_char, *mut c_int) -> *const SscNumber;
type ModuleCreateFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type ModuleExecFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> c_int;
type ModuleLogFn =
    unsafe extern "C" fn(*mut c_void, c_int, *mut c_int, *mut f32) -> *const c_char;
type ModuleFreeFn = unsafe extern "C" fn(*mut c_void);

const SSC_WARNING: c_int = 2;
const SSC_ERROR: c_int = 3;

/// Resolves where to load the engine from.
///
/// An explicit path wins, then [`LIBRARY_ENV`], then the platform file name
/// for `ssc` (`libssc.so`, `libssc.dylib`, `ssc.dll`) on the loader's
/// search path.
pub fn resolve_library_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var_os(LIBRARY_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(libloading::library_filename("ssc")),
    }
}

/// The SSC C API resolved from a shared library.
pub struct NativeSsc {
    path: PathBuf,
    version: VersionFn,
    data_create: DataCreateFn,
    data_free: DataFreeFn,
    set_number: SetNumberFn,
    set_array: SetArrayFn,
    set_table: SetTableFn,
    get_array: GetArrayFn,
    module_create: ModuleCreateFn,
    module_exec: ModuleExecFn,
    module_log: ModuleLogFn,
    module_free: ModuleFreeFn,
    // Function pointers above are only valid while this is loaded.
    _library: Library,
}

impl NativeSsc {
    /// Loads the engine and resolves every entry point up front.
    ///
    /// # Errors
    ///
    /// [`Error::Library`] if the file cannot be loaded, [`Error::Symbol`] if
    /// it is not an SSC build.
    pub fn load(path: &Path) -> Result<Self> {
        // SAFETY: loading runs the library's initialisers; the SSC library
        // has none with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|source| Error::Library {
            path: path.display().to_string(),
            source,
        })?;

        let ssc = Self {
            path: path.to_path_buf(),
            version: symbol(&library, "ssc_version")?,
            data_create: symbol(&library, "ssc_data_create")?,
            data_free: symbol(&library, "ssc_data_free")?,
            set_number: symbol(&library, "ssc_data_set_number")?,
            set_array: symbol(&library, "ssc_data_set_array")?,
            set_table: symbol(&library, "ssc_data_set_table")?,
            get_array: symbol(&library, "ssc_data_get_array")?,
            module_create: symbol(&library, "ssc_module_create")?,
            module_exec: symbol(&library, "ssc_module_exec")?,
            module_log: symbol(&library, "ssc_module_log")?,
            module_free: symbol(&library, "ssc_module_free")?,
            _library: library,
        };
        info!(path = %path.display(), version = ssc.version(), "loaded SSC");
        Ok(ssc)
    }

    /// Location the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T> {
    // SAFETY: every `T` used above matches the C prototype in sscapi.h.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|source| Error::Symbol { name, source })
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::InvalidName(name.to_string()))
}

fn data_ptr(data: DataHandle) -> *mut c_void {
    data.as_raw() as *mut c_void
}

fn module_ptr(module: ModuleHandle) -> *mut c_void {
    module.as_raw() as *mut c_void
}

impl SscApi for NativeSsc {
    fn version(&self) -> i32 {
        // SAFETY: no arguments, no preconditions.
        unsafe { (self.version)() }
    }

    fn data_create(&self) -> Result<DataHandle> {
        // SAFETY: no arguments; null is checked below.
        let raw = unsafe { (self.data_create)() };
        if raw.is_null() {
            return Err(Error::NullHandle("ssc_data_create"));
        }
        Ok(DataHandle::from_raw(raw as usize))
    }

    fn data_free(&self, data: DataHandle) {
        // SAFETY: handles only come from `data_create` and `Data` frees once.
        unsafe { (self.data_free)(data_ptr(data)) }
    }

    fn data_set_number(&self, data: DataHandle, name: &str, value: f64) -> Result<()> {
        let name = c_name(name)?;
        // SAFETY: live handle, NUL-terminated name; the engine copies both.
        unsafe { (self.set_number)(data_ptr(data), name.as_ptr(), value as SscNumber) };
        Ok(())
    }

    fn data_set_array(&self, data: DataHandle, name: &str, values: &[f64]) -> Result<()> {
        let len = c_int::try_from(values.len()).map_err(|_| Error::ArrayTooLong {
            name: name.to_string(),
            len: values.len(),
        })?;
        let c = c_name(name)?;
        let narrowed: Vec<SscNumber> = values.iter().map(|&v| v as SscNumber).collect();
        // SAFETY: `narrowed` holds exactly `len` numbers and outlives the call;
        // the engine copies the array.
        unsafe { (self.set_array)(data_ptr(data), c.as_ptr(), narrowed.as_ptr(), len) };
        Ok(())
    }

    fn data_set_table(&self, data: DataHandle, name: &str, table: DataHandle) -> Result<()> {
        let name = c_name(name)?;
        // SAFETY: both handles live; the engine deep-copies `table`.
        unsafe { (self.set_table)(data_ptr(data), name.as_ptr(), data_ptr(table)) };
        Ok(())
    }

    fn data_get_array(&self, data: DataHandle, name: &str) -> Result<Option<Vec<f64>>> {
        let name = c_name(name)?;
        let mut len: c_int = 0;
        // SAFETY: live handle; `len` is a valid out-pointer.
        let raw = unsafe { (self.get_array)(data_ptr(data), name.as_ptr(), &mut len) };
        if raw.is_null() {
            return Ok(None);
        }
        let len = usize::try_from(len).unwrap_or(0);
        // SAFETY: the engine returned `len` numbers owned by `data`, which is
        // not modified while the slice is alive.
        let values = unsafe { std::slice::from_raw_parts(raw, len) };
        Ok(Some(values.iter().map(|&v| f64::from(v)).collect()))
    }

    fn module_create(&self, name: &str) -> Result<Option<ModuleHandle>> {
        let name = c_name(name)?;
        // SAFETY: NUL-terminated name; null means no such module.
        let raw = unsafe { (self.module_create)(name.as_ptr()) };
        Ok((!raw.is_null()).then(|| ModuleHandle::from_raw(raw as usize)))
    }

    fn module_exec(&self, module: ModuleHandle, data: DataHandle) -> bool {
        // SAFETY: both handles live for the duration of the call.
        unsafe { (self.module_exec)(module_ptr(module), data_ptr(data)) != 0 }
    }

    fn module_log(&self, module: ModuleHandle, index: usize) -> Option<LogEntry> {
        let index = c_int::try_from(index).ok()?;
        let mut kind: c_int = 0;
        let mut time: f32 = 0.0;
        // SAFETY: live handle; both out-pointers are valid.
        let raw = unsafe { (self.module_log)(module_ptr(module), index, &mut kind, &mut time) };
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null log text is NUL-terminated and owned by the module.
        let message = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        let level = match kind {
            SSC_ERROR => LogLevel::Error,
            SSC_WARNING => LogLevel::Warning,
            _ => LogLevel::Notice,
        };
        Some(LogEntry {
            level,
            time,
            message,
        })
    }

    fn module_free(&self, module: ModuleHandle) {
        // SAFETY: handles only come from `module_create` and `Module` frees once.
        unsafe { (self.module_free)(module_ptr(module)) }
    }
}

impl std::fmt::Debug for NativeSsc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeSsc").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn explicit_path_wins() {
        let p = resolve_library_path(Some(Path::new("/opt/sam/libssc.so")));
        assert_eq!(p, PathBuf::from("/opt/sam/libssc.so"));
    }

    #[test]
    fn missing_library_is_reported() {
        let err = NativeSsc::load(Path::new("/nonexistent/dir/libssc-missing.so")).unwrap_err();
        match err {
            Error::Library { path, .. } => assert!(path.contains("libssc-missing")),
            other => panic!("expected library error, got {other}"),
        }
    }

    #[test]
    fn interior_nul_rejected() {
        assert!(matches!(c_name("gen\0x"), Err(Error::InvalidName(_))));
        assert!(c_name("adjust:constant").is_ok());
    }

    #[test]
    fn null_pointer_round_trips_through_handle() {
        let h = DataHandle::from_raw(ptr::null_mut::<c_void>() as usize);
        assert!(data_ptr(h).is_null());
    }
}
