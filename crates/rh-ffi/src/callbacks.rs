//! Reverse-callback boundary
//!
//! libretro callbacks carry no user pointer, so the frontend that currently
//! owns a core is published through a process-wide slot. The `extern "C"`
//! trampolines below are the only functions handed to a core; they decode raw
//! arguments, look up the active [`CoreCallbacks`] and dispatch to it.
//!
//! Every trampoline runs its body under `catch_unwind`. A panic is logged and
//! turned into the neutral return value, never unwound into the core.

use crate::abi::*;
use parking_lot::RwLock;
use rh_core::CoreLoadError;
use std::ffi::{c_char, c_uint, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Environment request decoded from a raw command and payload
#[derive(Debug)]
pub enum EnvCommand<'a> {
    /// Write the system directory pointer (or null) into the slot
    GetSystemDirectory(&'a mut *const c_char),
    /// Raw pixel format code requested by the core
    SetPixelFormat(c_uint),
    /// Any command this frontend does not implement
    Unsupported(c_uint),
}

/// One video frame as handed over by the core
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// `pitch * height` bytes starting at the core's buffer
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per source row
    pub pitch: usize,
}

/// Capability set a core can call back into
///
/// Implementations are invoked on whatever thread the core calls from,
/// normally the execution loop worker inside `retro_run`.
pub trait CoreCallbacks: Send + Sync {
    /// Answer an environment request. Returns `false` when unhandled.
    fn on_environment(&self, command: EnvCommand<'_>) -> bool;

    /// Present a frame. `None` means the core passed a null buffer.
    fn on_video_frame(&self, frame: Option<RawFrame<'_>>);

    /// One stereo frame
    fn on_audio_sample(&self, left: i16, right: i16);

    /// Interleaved stereo frames; returns how many frames were consumed
    fn on_audio_batch(&self, samples: &[i16]) -> usize;

    fn on_input_poll(&self);

    fn on_input_state(&self, port: u32, device: u32, index: u32, id: u32) -> i16;
}

static ACTIVE: RwLock<Option<Arc<dyn CoreCallbacks>>> = parking_lot::const_rwlock(None);

/// Ownership of the process-wide callback slot
///
/// The slot is cleared when the guard drops.
pub struct SlotGuard {
    owner: Arc<dyn CoreCallbacks>,
}

impl SlotGuard {
    /// Publish `target` as the receiver of all core callbacks
    pub fn claim(target: Arc<dyn CoreCallbacks>) -> Result<Self, CoreLoadError> {
        let mut slot = ACTIVE.write();
        if slot.is_some() {
            tracing::warn!("Callback slot already claimed by another session");
            return Err(CoreLoadError::CallbackSlotBusy);
        }
        *slot = Some(Arc::clone(&target));
        tracing::debug!("Callback slot claimed");
        Ok(Self { owner: target })
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = ACTIVE.write();
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &self.owner))
        {
            *slot = None;
            tracing::debug!("Callback slot released");
        }
    }
}

/// Whether any session currently owns the slot
pub fn slot_claimed() -> bool {
    ACTIVE.read().is_some()
}

fn active() -> Option<Arc<dyn CoreCallbacks>> {
    ACTIVE.read().clone()
}

fn guarded<R>(name: &str, fallback: R, body: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("Panic in {} callback suppressed at the core boundary", name);
            fallback
        }
    }
}

/// Environment trampoline
///
/// # Safety
///
/// Called by the core with a payload matching `cmd` as defined by libretro.
pub unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    guarded("environment", false, || {
        let command = match cmd {
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY | RETRO_ENVIRONMENT_SET_PIXEL_FORMAT
                if data.is_null() =>
            {
                tracing::warn!("Environment command {} with null payload", cmd);
                return false;
            }
            // SAFETY: non-null, and libretro defines the payload as `const char **`.
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
                EnvCommand::GetSystemDirectory(unsafe { &mut *(data as *mut *const c_char) })
            }
            // SAFETY: non-null, and libretro defines the payload as `const enum retro_pixel_format *`.
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT => {
                EnvCommand::SetPixelFormat(unsafe { *(data as *const c_uint) })
            }
            other => EnvCommand::Unsupported(other),
        };
        active().is_some_and(|target| target.on_environment(command))
    })
}

/// Video refresh trampoline
///
/// # Safety
///
/// `data` must be null or point to at least `pitch * height` readable bytes.
pub unsafe extern "C" fn video_refresh(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    guarded("video_refresh", (), || {
        let Some(target) = active() else { return };

        let frame = if data.is_null() {
            None
        } else {
            let len = pitch.saturating_mul(height as usize);
            // SAFETY: the core guarantees `pitch * height` bytes behind a non-null frame.
            let bytes = unsafe { std::slice::from_raw_parts(data as *const u8, len) };
            Some(RawFrame {
                data: bytes,
                width,
                height,
                pitch,
            })
        };
        target.on_video_frame(frame);
    })
}

/// Single audio frame trampoline
///
/// # Safety
///
/// Always safe to call; marked `unsafe` to match the libretro callback type.
pub unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    guarded("audio_sample", (), || {
        if let Some(target) = active() {
            target.on_audio_sample(left, right);
        }
    })
}

/// Audio batch trampoline
///
/// Always reports every frame as consumed.
///
/// # Safety
///
/// `data` must be null or point to `frames * 2` interleaved samples.
pub unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    guarded("audio_sample_batch", frames, || {
        if data.is_null() || frames == 0 {
            return frames;
        }
        if let Some(target) = active() {
            // SAFETY: the core hands over `frames` stereo frames of two samples each.
            let samples = unsafe { std::slice::from_raw_parts(data, frames.saturating_mul(2)) };
            target.on_audio_batch(samples);
        }
        frames
    })
}

/// Input poll trampoline
///
/// # Safety
///
/// Always safe to call; marked `unsafe` to match the libretro callback type.
pub unsafe extern "C" fn input_poll() {
    guarded("input_poll", (), || {
        if let Some(target) = active() {
            target.on_input_poll();
        }
    })
}

/// Input state trampoline
///
/// # Safety
///
/// Always safe to call; marked `unsafe` to match the libretro callback type.
pub unsafe extern "C" fn input_state(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
    guarded("input_state", 0, || {
        active().map_or(0, |target| target.on_input_state(port, device, index, id))
    })
}
