//! Core module handle
//!
//! Owns the loaded library (if any) together with its resolved entry points
//! and exposes the libretro calls as safe methods.

use crate::abi::*;
use crate::callbacks;
use crate::symbols::CoreSymbols;
use rh_core::CoreLoadError;
use std::ffi::{c_void, CStr};
use std::path::{Path, PathBuf};

/// A loaded libretro core
pub struct CoreModule {
    symbols: CoreSymbols,
    path: Option<PathBuf>,
    // Must outlive every call through `symbols`; dropped last.
    library: Option<libloading::Library>,
}

impl CoreModule {
    /// Open a core library and resolve every required entry point
    ///
    /// On failure the library is closed again before returning.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers, and the resolved symbols are
    /// trusted to have libretro signatures.
    pub unsafe fn open(path: &Path) -> Result<Self, CoreLoadError> {
        tracing::info!("Opening core: {}", path.display());

        let library = open_library(path).map_err(|e| {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            CoreLoadError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let symbols = CoreSymbols::resolve(|name| {
            library
                .get::<*const c_void>(name.as_bytes())
                .ok()
                .map(|symbol| *symbol)
        })?;

        tracing::info!("Resolved all core symbols from {}", path.display());

        Ok(Self {
            symbols,
            path: Some(path.to_path_buf()),
            library: Some(library),
        })
    }

    /// Wrap a statically linked core
    pub fn from_symbols(symbols: CoreSymbols) -> Self {
        Self {
            symbols,
            path: None,
            library: None,
        }
    }

    /// Check that `path` opens and exports every required symbol
    ///
    /// The core is closed again without being initialised.
    ///
    /// # Safety
    ///
    /// Same contract as [`CoreModule::open`].
    pub unsafe fn probe(path: &Path) -> Result<(), CoreLoadError> {
        let module = Self::open(path)?;
        tracing::info!(
            "Core {} is viable (API version {})",
            path.display(),
            module.api_version()
        );
        Ok(())
    }

    /// Library path, `None` for statically linked cores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }

    pub fn api_version(&self) -> u32 {
        // SAFETY: resolved entry point with no preconditions.
        unsafe { (self.symbols.retro_api_version)() }
    }

    /// Register the frontend trampolines with the core
    pub fn register_callbacks(&self) {
        // SAFETY: each setter stores a function pointer with 'static lifetime.
        unsafe {
            (self.symbols.retro_set_environment)(callbacks::environment);
            (self.symbols.retro_set_video_refresh)(callbacks::video_refresh);
            (self.symbols.retro_set_audio_sample)(callbacks::audio_sample);
            (self.symbols.retro_set_audio_sample_batch)(callbacks::audio_sample_batch);
            (self.symbols.retro_set_input_poll)(callbacks::input_poll);
            (self.symbols.retro_set_input_state)(callbacks::input_state);
        }
    }

    pub fn init(&self) {
        // SAFETY: called once after callbacks are registered.
        unsafe { (self.symbols.retro_init)() }
    }

    pub fn deinit(&self) {
        // SAFETY: called once, with no run step in flight.
        unsafe { (self.symbols.retro_deinit)() }
    }

    /// Ask the core to load content by path; returns the core's verdict
    pub fn load_game(&self, path: &CStr) -> bool {
        let info = RetroGameInfo {
            path: path.as_ptr(),
            data: std::ptr::null(),
            size: 0,
            meta: std::ptr::null(),
        };
        // SAFETY: `info` and the path it points to outlive the call.
        unsafe { (self.symbols.retro_load_game)(&info) }
    }

    pub fn unload_game(&self) {
        // SAFETY: called with no run step in flight.
        unsafe { (self.symbols.retro_unload_game)() }
    }

    /// Run-step entry point, for the execution loop worker
    pub fn run_fn(&self) -> RunFn {
        self.symbols.retro_run
    }
}

impl Drop for CoreModule {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            tracing::info!("Closing core: {}", path.display());
        }
    }
}

#[cfg(unix)]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};
    Library::open(Some(path), RTLD_NOW | RTLD_LOCAL).map(Into::into)
}

#[cfg(not(unix))]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    libloading::Library::new(path)
}
