//! libretro ABI definitions
//!
//! Only the subset of `libretro.h` this frontend speaks is declared here.

use std::ffi::{c_char, c_uint, c_void};

/// API version this frontend implements
pub const RETRO_API_VERSION: c_uint = 1;

// Environment commands
pub const RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 8;
pub const RETRO_ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;

// Pixel format codes
pub const RETRO_PIXEL_FORMAT_XRGB8888: c_uint = 1;
pub const RETRO_PIXEL_FORMAT_RGB565: c_uint = 2;

// Input device
pub const RETRO_DEVICE_JOYPAD: c_uint = 1;

/// Content descriptor passed to `retro_load_game`
#[repr(C)]
#[derive(Debug)]
pub struct RetroGameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

// Callbacks the frontend hands to the core
pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;
pub type InputPollFn = unsafe extern "C" fn();
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;

// Entry points exported by the core
pub type ApiVersionFn = unsafe extern "C" fn() -> c_uint;
pub type SetEnvironmentFn = unsafe extern "C" fn(cb: EnvironmentFn);
pub type SetVideoRefreshFn = unsafe extern "C" fn(cb: VideoRefreshFn);
pub type SetAudioSampleFn = unsafe extern "C" fn(cb: AudioSampleFn);
pub type SetAudioSampleBatchFn = unsafe extern "C" fn(cb: AudioSampleBatchFn);
pub type SetInputPollFn = unsafe extern "C" fn(cb: InputPollFn);
pub type SetInputStateFn = unsafe extern "C" fn(cb: InputStateFn);
pub type InitFn = unsafe extern "C" fn();
pub type DeinitFn = unsafe extern "C" fn();
pub type LoadGameFn = unsafe extern "C" fn(game: *const RetroGameInfo) -> bool;
pub type UnloadGameFn = unsafe extern "C" fn();
pub type RunFn = unsafe extern "C" fn();
