//! In-process libretro core for the integration tests
//!
//! Every entry point is a plain `extern "C"` function recording what the
//! frontend did in statics. Tests touching this core must hold [`serial`].

#![allow(dead_code)]

use parking_lot::{const_mutex, Mutex, MutexGuard};
use rh_ffi::abi::*;
use rh_ffi::CoreSymbols;
use std::ffi::{c_char, c_uint, c_void, CStr};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub const FRAME_WIDTH: u32 = 256;
pub const FRAME_HEIGHT: u32 = 224;
pub const FRAME_PITCH: usize = 1024;

/// `REQUESTED_FORMAT` value meaning "do not negotiate"
pub const NO_FORMAT_REQUEST: u32 = u32::MAX;

/// Joypad id the core polls every step
pub const POLLED_BUTTON: c_uint = 8;

static SERIAL: Mutex<()> = const_mutex(());

static ENVIRONMENT: Mutex<Option<EnvironmentFn>> = const_mutex(None);
static VIDEO: Mutex<Option<VideoRefreshFn>> = const_mutex(None);
static AUDIO_SAMPLE: Mutex<Option<AudioSampleFn>> = const_mutex(None);
static AUDIO_BATCH: Mutex<Option<AudioSampleBatchFn>> = const_mutex(None);
static INPUT_POLL: Mutex<Option<InputPollFn>> = const_mutex(None);
static INPUT_STATE: Mutex<Option<InputStateFn>> = const_mutex(None);

pub static INIT_CALLS: AtomicU32 = AtomicU32::new(0);
pub static DEINIT_CALLS: AtomicU32 = AtomicU32::new(0);
pub static LOAD_GAME_CALLS: AtomicU32 = AtomicU32::new(0);
pub static UNLOAD_GAME_CALLS: AtomicU32 = AtomicU32::new(0);
pub static RUN_STEPS: AtomicU64 = AtomicU64::new(0);
pub static IN_STEP: AtomicBool = AtomicBool::new(false);

pub static REQUESTED_FORMAT: AtomicU32 = AtomicU32::new(NO_FORMAT_REQUEST);
pub static NULL_PAYLOAD_HANDLED: AtomicBool = AtomicBool::new(true);
pub static UNSUPPORTED_HANDLED: AtomicBool = AtomicBool::new(true);
pub static SYSTEM_DIR_QUERIED: AtomicBool = AtomicBool::new(false);
pub static SYSTEM_DIR_PTR: AtomicUsize = AtomicUsize::new(0);
pub static LAST_BUTTON_STATE: AtomicI32 = AtomicI32::new(-1);
pub static LAST_BATCH_RESULT: AtomicUsize = AtomicUsize::new(0);

/// Serialise tests that share the mock core and the callback slot
pub fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    reset();
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    guard
}

fn reset() {
    for counter in [&INIT_CALLS, &DEINIT_CALLS, &LOAD_GAME_CALLS, &UNLOAD_GAME_CALLS] {
        counter.store(0, Ordering::SeqCst);
    }
    RUN_STEPS.store(0, Ordering::SeqCst);
    IN_STEP.store(false, Ordering::SeqCst);
    REQUESTED_FORMAT.store(NO_FORMAT_REQUEST, Ordering::SeqCst);
    NULL_PAYLOAD_HANDLED.store(true, Ordering::SeqCst);
    UNSUPPORTED_HANDLED.store(true, Ordering::SeqCst);
    SYSTEM_DIR_QUERIED.store(false, Ordering::SeqCst);
    SYSTEM_DIR_PTR.store(0, Ordering::SeqCst);
    LAST_BUTTON_STATE.store(-1, Ordering::SeqCst);
    LAST_BATCH_RESULT.store(0, Ordering::SeqCst);
}

/// Poll `condition` until it holds, failing the test after five seconds
pub fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// The 256x224 XRGB8888 frame the core presents every step
pub fn frame() -> &'static [u8] {
    static FRAME: OnceLock<Vec<u8>> = OnceLock::new();
    FRAME.get_or_init(|| {
        let mut bytes = Vec::with_capacity(FRAME_PITCH * FRAME_HEIGHT as usize);
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                let pixel = (y << 12) | (x << 2) | 0x0300_0000;
                bytes.extend_from_slice(&pixel.to_ne_bytes());
            }
        }
        bytes
    })
}

/// System directory string the core last received, if it was non-null
pub fn recorded_system_dir() -> Option<String> {
    let ptr = SYSTEM_DIR_PTR.load(Ordering::SeqCst) as *const c_char;
    if ptr.is_null() {
        return None;
    }
    // SAFETY: the frontend keeps every string it handed out alive while loaded.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

unsafe fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    match *ENVIRONMENT.lock() {
        Some(env) => env(cmd, data),
        None => false,
    }
}

unsafe extern "C" fn api_version() -> c_uint {
    RETRO_API_VERSION
}

unsafe extern "C" fn set_environment(cb: EnvironmentFn) {
    *ENVIRONMENT.lock() = Some(cb);
}

unsafe extern "C" fn set_video_refresh(cb: VideoRefreshFn) {
    *VIDEO.lock() = Some(cb);
}

unsafe extern "C" fn set_audio_sample(cb: AudioSampleFn) {
    *AUDIO_SAMPLE.lock() = Some(cb);
}

unsafe extern "C" fn set_audio_sample_batch(cb: AudioSampleBatchFn) {
    *AUDIO_BATCH.lock() = Some(cb);
}

unsafe extern "C" fn set_input_poll(cb: InputPollFn) {
    *INPUT_POLL.lock() = Some(cb);
}

unsafe extern "C" fn set_input_state(cb: InputStateFn) {
    *INPUT_STATE.lock() = Some(cb);
}

unsafe extern "C" fn init() {
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);

    let handled = environment(RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY, std::ptr::null_mut());
    NULL_PAYLOAD_HANDLED.store(handled, Ordering::SeqCst);

    let mut scratch: c_uint = 0;
    let handled = environment(3, &mut scratch as *mut c_uint as *mut c_void);
    UNSUPPORTED_HANDLED.store(handled, Ordering::SeqCst);

    let mut format = REQUESTED_FORMAT.load(Ordering::SeqCst);
    if format != NO_FORMAT_REQUEST {
        environment(
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT,
            &mut format as *mut c_uint as *mut c_void,
        );
    }
}

unsafe extern "C" fn deinit() {
    DEINIT_CALLS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn load_game(info: *const RetroGameInfo) -> bool {
    LOAD_GAME_CALLS.fetch_add(1, Ordering::SeqCst);

    let mut dir: *const c_char = std::ptr::null();
    if environment(
        RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY,
        &mut dir as *mut *const c_char as *mut c_void,
    ) {
        SYSTEM_DIR_QUERIED.store(true, Ordering::SeqCst);
        SYSTEM_DIR_PTR.store(dir as usize, Ordering::SeqCst);
    }

    let Some(info) = info.as_ref() else {
        return false;
    };
    if info.path.is_null() || !info.data.is_null() || info.size != 0 || !info.meta.is_null() {
        return false;
    }
    CStr::from_ptr(info.path).to_bytes().ends_with(b".rom")
}

unsafe extern "C" fn unload_game() {
    UNLOAD_GAME_CALLS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn run() {
    IN_STEP.store(true, Ordering::SeqCst);

    if let Some(poll) = *INPUT_POLL.lock() {
        poll();
    }
    if let Some(state) = *INPUT_STATE.lock() {
        let value = state(0, RETRO_DEVICE_JOYPAD, 0, POLLED_BUTTON);
        LAST_BUTTON_STATE.store(value as i32, Ordering::SeqCst);
    }

    if let Some(video) = *VIDEO.lock() {
        let frame = frame();
        video(
            frame.as_ptr() as *const c_void,
            FRAME_WIDTH,
            FRAME_HEIGHT,
            FRAME_PITCH,
        );
    }

    if let Some(sample) = *AUDIO_SAMPLE.lock() {
        sample(100, -100);
    }
    if let Some(batch) = *AUDIO_BATCH.lock() {
        let samples: [i16; 4] = [1, 2, 3, 4];
        let consumed = batch(samples.as_ptr(), 2);
        LAST_BATCH_RESULT.store(consumed, Ordering::SeqCst);
    }

    std::thread::sleep(Duration::from_millis(1));
    RUN_STEPS.fetch_add(1, Ordering::SeqCst);
    IN_STEP.store(false, Ordering::SeqCst);
}

/// Entry point table of the mock core
pub fn symbols() -> CoreSymbols {
    CoreSymbols {
        retro_api_version: api_version,
        retro_set_environment: set_environment,
        retro_set_video_refresh: set_video_refresh,
        retro_set_audio_sample: set_audio_sample,
        retro_set_audio_sample_batch: set_audio_sample_batch,
        retro_set_input_poll: set_input_poll,
        retro_set_input_state: set_input_state,
        retro_init: init,
        retro_deinit: deinit,
        retro_load_game: load_game,
        retro_unload_game: unload_game,
        retro_run: run,
    }
}

/// Symbol lookup over the mock core that reports `missing` as absent
pub fn lookup_without(missing: &'static str) -> impl FnMut(&'static str) -> Option<*const c_void> {
    let s = symbols();
    move |name| {
        if name == missing {
            return None;
        }
        let address = match name {
            "retro_api_version" => s.retro_api_version as *const c_void,
            "retro_set_environment" => s.retro_set_environment as *const c_void,
            "retro_set_video_refresh" => s.retro_set_video_refresh as *const c_void,
            "retro_set_audio_sample" => s.retro_set_audio_sample as *const c_void,
            "retro_set_audio_sample_batch" => s.retro_set_audio_sample_batch as *const c_void,
            "retro_set_input_poll" => s.retro_set_input_poll as *const c_void,
            "retro_set_input_state" => s.retro_set_input_state as *const c_void,
            "retro_init" => s.retro_init as *const c_void,
            "retro_deinit" => s.retro_deinit as *const c_void,
            "retro_load_game" => s.retro_load_game as *const c_void,
            "retro_unload_game" => s.retro_unload_game as *const c_void,
            "retro_run" => s.retro_run as *const c_void,
            _ => return None,
        };
        Some(address)
    }
}
