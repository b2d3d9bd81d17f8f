//! Entry point table resolution
//!
//! Resolution is all-or-nothing: a table is only ever built once every
//! required symbol has been found, so the rest of the frontend never handles a
//! nullable function pointer.

use crate::abi::*;
use rh_core::CoreLoadError;
use std::ffi::c_void;

/// Every symbol a core must export, in resolution order
pub const REQUIRED_SYMBOLS: [&str; 12] = [
    "retro_api_version",
    "retro_set_environment",
    "retro_set_video_refresh",
    "retro_set_audio_sample",
    "retro_set_audio_sample_batch",
    "retro_set_input_poll",
    "retro_set_input_state",
    "retro_init",
    "retro_deinit",
    "retro_load_game",
    "retro_unload_game",
    "retro_run",
];

/// Resolved libretro entry points
#[derive(Clone, Copy)]
pub struct CoreSymbols {
    pub retro_api_version: ApiVersionFn,
    pub retro_set_environment: SetEnvironmentFn,
    pub retro_set_video_refresh: SetVideoRefreshFn,
    pub retro_set_audio_sample: SetAudioSampleFn,
    pub retro_set_audio_sample_batch: SetAudioSampleBatchFn,
    pub retro_set_input_poll: SetInputPollFn,
    pub retro_set_input_state: SetInputStateFn,
    pub retro_init: InitFn,
    pub retro_deinit: DeinitFn,
    pub retro_load_game: LoadGameFn,
    pub retro_unload_game: UnloadGameFn,
    pub retro_run: RunFn,
}

impl std::fmt::Debug for CoreSymbols {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreSymbols")
            .field("retro_run", &(self.retro_run as *const c_void))
            .finish_non_exhaustive()
    }
}

impl CoreSymbols {
    /// Resolve the full table through `lookup`
    ///
    /// `lookup` returns the address a name is bound to, or `None` when the
    /// module does not export it. Null addresses count as missing.
    ///
    /// # Safety
    ///
    /// Every non-null address returned by `lookup` must point to a function
    /// with the libretro signature for that name, and must stay valid for as
    /// long as the returned table is used.
    pub unsafe fn resolve<F>(mut lookup: F) -> Result<Self, CoreLoadError>
    where
        F: FnMut(&'static str) -> Option<*const c_void>,
    {
        let mut addresses = [std::ptr::null::<c_void>(); REQUIRED_SYMBOLS.len()];
        let mut missing = Vec::new();

        for (slot, name) in addresses.iter_mut().zip(REQUIRED_SYMBOLS) {
            match lookup(name) {
                Some(addr) if !addr.is_null() => {
                    tracing::debug!("Resolved {} at {:p}", name, addr);
                    *slot = addr;
                }
                _ => {
                    tracing::error!("Missing core symbol {}", name);
                    missing.push(name);
                }
            }
        }

        if !missing.is_empty() {
            return Err(CoreLoadError::MissingSymbols(missing));
        }

        macro_rules! entry {
            ($index:expr, $ty:ty) => {
                std::mem::transmute::<*const c_void, $ty>(addresses[$index])
            };
        }

        Ok(Self {
            retro_api_version: entry!(0, ApiVersionFn),
            retro_set_environment: entry!(1, SetEnvironmentFn),
            retro_set_video_refresh: entry!(2, SetVideoRefreshFn),
            retro_set_audio_sample: entry!(3, SetAudioSampleFn),
            retro_set_audio_sample_batch: entry!(4, SetAudioSampleBatchFn),
            retro_set_input_poll: entry!(5, SetInputPollFn),
            retro_set_input_state: entry!(6, SetInputStateFn),
            retro_init: entry!(7, InitFn),
            retro_deinit: entry!(8, DeinitFn),
            retro_load_game: entry!(9, LoadGameFn),
            retro_unload_game: entry!(10, UnloadGameFn),
            retro_run: entry!(11, RunFn),
        })
    }
}
