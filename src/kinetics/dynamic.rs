// kinetics/dynamic.rs
// Kinetics engine provided by a shared library with the redoxKineticsFull C ABI

use libloading::{Library, Symbol};
use std::os::raw::c_int;
use std::path::{Path, PathBuf};

use super::{check_output, KineticsEngine, KineticsInput};
use crate::config::KINETICS_SYMBOL;
use crate::error::{SimError, SimResult};
use crate::profile_scope;

/// `(time_step, resistance, site_count, sequence_length, raw, corrected, g, k0, e0, a, z) -> current`
type KineticsFn = unsafe extern "C" fn(
    f64,
    f64,
    c_int,
    c_int,
    *const f64,
    *const f64,
    *const f64,
    *const f64,
    *const f64,
    *const f64,
    *const f64,
) -> *mut f64;

/// Frees a buffer returned by [`KineticsFn`].
type ReleaseFn = unsafe extern "C" fn(*mut f64);

/// External engine loaded at runtime. Calls are serialized by the caller.
pub struct DynamicEngine {
    library: Library,
    path: PathBuf,
    symbol: String,
    release_symbol: Option<String>,
}

impl DynamicEngine {
    /// Load `path` and resolve the default kinetics symbol.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        Self::load_with(path, KINETICS_SYMBOL, None)
    }

    pub fn load_with(path: impl AsRef<Path>, symbol: &str, release_symbol: Option<&str>) -> SimResult<Self> {
        let path = path.as_ref().to_path_buf();
        let library = unsafe { Library::new(&path) }?;
        let engine = Self {
            library,
            path,
            symbol: symbol.to_string(),
            release_symbol: release_symbol.map(str::to_string),
        };
        engine.kinetics_fn()?;
        if let Some(release) = &engine.release_symbol {
            unsafe { engine.library.get::<ReleaseFn>(release.as_bytes()) }
                .map_err(|e| SimError::NativeEngineFailure(format!("missing release symbol '{release}': {e}")))?;
        } else {
            log::warn!(
                "{} has no release symbol configured; returned buffers will not be freed",
                engine.path.display()
            );
        }
        log::info!("loaded kinetics engine '{}' from {}", engine.symbol, engine.path.display());
        Ok(engine)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn kinetics_fn(&self) -> SimResult<Symbol<'_, KineticsFn>> {
        unsafe { self.library.get::<KineticsFn>(self.symbol.as_bytes()) }
            .map_err(|e| SimError::NativeEngineFailure(format!("missing symbol '{}': {e}", self.symbol)))
    }
}

fn as_c_int(value: usize, what: &str) -> SimResult<c_int> {
    c_int::try_from(value)
        .map_err(|_| SimError::NativeEngineFailure(format!("{what} {value} does not fit the engine's int argument")))
}

impl KineticsEngine for DynamicEngine {
    fn name(&self) -> &str {
        &self.symbol
    }

    fn full_response(&self, input: &KineticsInput<'_>) -> SimResult<Vec<f64>> {
        profile_scope!("kinetics");
        input.validate()?;
        let len = input.len();
        let sites = as_c_int(input.surface.len(), "site count")?;
        let samples = as_c_int(len, "sequence length")?;
        let surface = input.surface;
        let kinetics = self.kinetics_fn()?;

        // Safety: every pointer refers to a live slice whose length matches
        // the count passed alongside it; the engine only reads them.
        let buffer = unsafe {
            kinetics(
                input.time_step,
                input.resistance,
                sites,
                samples,
                input.raw.as_ptr(),
                input.corrected.as_ptr(),
                surface.g.as_ptr(),
                surface.k0.as_ptr(),
                surface.e0.as_ptr(),
                surface.a.as_ptr(),
                surface.z.as_ptr(),
            )
        };
        if buffer.is_null() {
            return Err(SimError::NativeEngineFailure(format!(
                "{} returned a null buffer",
                self.symbol
            )));
        }

        // Safety: the engine returns `len` doubles on success.
        let response = unsafe { std::slice::from_raw_parts(buffer, len) }.to_vec();
        if let Some(release) = &self.release_symbol {
            if let Ok(free) = unsafe { self.library.get::<ReleaseFn>(release.as_bytes()) } {
                unsafe { free(buffer) };
            }
        }

        check_output(&self.symbol, len, &response)?;
        Ok(response)
    }
}
