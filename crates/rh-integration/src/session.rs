//! Per-frontend session state
//!
//! The [`Session`] is the object a core talks to through the callback slot.
//! It owns everything the callbacks touch: the active pixel format, the
//! system directory string, the display surface binding, the input table and
//! the audio sink.

use parking_lot::Mutex;
use rh_audio::AudioSink;
use rh_core::{HostError, Result};
use rh_ffi::{CoreCallbacks, EnvCommand, RawFrame};
use rh_input::InputTable;
use rh_video::{present, PixelFormat, RenderTarget};
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Counters collected while a core runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub audio_frames: u64,
}

/// System directory strings handed to the core
///
/// A core may keep the pointer it was given, so replaced strings are retired
/// rather than freed and only released once the core is gone.
#[derive(Default)]
struct SystemDir {
    current: Option<CString>,
    retired: Vec<CString>,
}

/// Callback context for one frontend
pub struct Session {
    pixel_format: AtomicU32,
    system_dir: Mutex<SystemDir>,
    surface: Mutex<Option<Box<dyn RenderTarget>>>,
    input: InputTable,
    audio: Arc<dyn AudioSink>,
    max_dimension: u32,
    fast_forward: AtomicBool,
    frames_presented: AtomicU64,
    frames_dropped: AtomicU64,
    audio_frames: AtomicU64,
}

impl Session {
    pub fn new(audio: Arc<dyn AudioSink>, max_dimension: u32) -> Self {
        Self {
            pixel_format: AtomicU32::new(PixelFormat::default().raw()),
            system_dir: Mutex::new(SystemDir::default()),
            surface: Mutex::new(None),
            input: InputTable::new(),
            audio,
            max_dimension,
            fast_forward: AtomicBool::new(false),
            frames_presented: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            audio_frames: AtomicU64::new(0),
        }
    }

    pub fn pixel_format(&self) -> PixelFormat {
        PixelFormat::from_raw(self.pixel_format.load(Ordering::Acquire))
    }

    /// Back to XRGB8888, done for every newly loaded core
    pub fn reset_pixel_format(&self) {
        self.pixel_format
            .store(PixelFormat::default().raw(), Ordering::Release);
    }

    /// Set or clear the directory reported for "get system directory"
    pub fn set_system_dir(&self, path: Option<&Path>) -> Result<()> {
        let value = path.map(path_to_cstring).transpose()?;
        let mut dir = self.system_dir.lock();
        if let Some(old) = std::mem::replace(&mut dir.current, value) {
            dir.retired.push(old);
        }
        match path {
            Some(path) => tracing::info!("System directory set to {}", path.display()),
            None => tracing::info!("System directory cleared"),
        }
        Ok(())
    }

    pub fn system_dir(&self) -> Option<PathBuf> {
        self.system_dir
            .lock()
            .current
            .as_ref()
            .map(|s| PathBuf::from(s.to_string_lossy().into_owned()))
    }

    /// Free replaced system directory strings; only valid with no core loaded
    pub fn release_retired_dirs(&self) {
        let mut dir = self.system_dir.lock();
        if !dir.retired.is_empty() {
            tracing::debug!("Releasing {} retired system directory strings", dir.retired.len());
            dir.retired.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn retired_dir_count(&self) -> usize {
        self.system_dir.lock().retired.len()
    }

    /// Bind a render target, releasing any previous one
    pub fn attach_surface(&self, target: Box<dyn RenderTarget>) {
        let mut surface = self.surface.lock();
        if surface.is_some() {
            tracing::info!("Replacing attached surface");
        }
        *surface = Some(target);
    }

    /// Release the bound render target; returns whether one was bound
    ///
    /// Callers must make sure no run step is in flight.
    pub fn detach_surface(&self) -> bool {
        let mut surface = self.surface.lock();
        match surface.take() {
            Some(target) => {
                drop(target);
                true
            }
            None => false,
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.lock().is_some()
    }

    pub fn input(&self) -> &InputTable {
        &self.input
    }

    pub fn set_fast_forward(&self, enabled: bool) {
        self.fast_forward.store(enabled, Ordering::Relaxed);
    }

    pub fn fast_forward(&self) -> bool {
        self.fast_forward.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_presented: self.frames_presented.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            audio_frames: self.audio_frames.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.frames_presented.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
        self.audio_frames.store(0, Ordering::Relaxed);
    }

    fn drop_frame(&self, reason: &str) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Dropped frame: {}", reason);
    }
}

impl CoreCallbacks for Session {
    fn on_environment(&self, command: EnvCommand<'_>) -> bool {
        match command {
            EnvCommand::GetSystemDirectory(slot) => {
                let dir = self.system_dir.lock();
                *slot = dir
                    .current
                    .as_ref()
                    .map_or(std::ptr::null(), |s| s.as_ptr());
                tracing::debug!("Core queried system directory");
                true
            }
            EnvCommand::SetPixelFormat(code) => {
                self.pixel_format.store(code, Ordering::Release);
                tracing::debug!("Core set pixel format {:?}", PixelFormat::from_raw(code));
                true
            }
            EnvCommand::Unsupported(cmd) => {
                tracing::trace!("Unhandled environment command {}", cmd);
                false
            }
        }
    }

    fn on_video_frame(&self, frame: Option<RawFrame<'_>>) {
        let Some(frame) = frame else {
            return self.drop_frame("null buffer");
        };
        if frame.width == 0
            || frame.height == 0
            || frame.width > self.max_dimension
            || frame.height > self.max_dimension
        {
            return self.drop_frame("geometry out of range");
        }

        let mut surface = self.surface.lock();
        let Some(target) = surface.as_mut() else {
            return self.drop_frame("no surface attached");
        };

        match present(&mut **target, &frame, self.pixel_format()) {
            Ok(()) => {
                self.frames_presented.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Presented {}x{} frame", frame.width, frame.height);
            }
            Err(e) => {
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Frame not presented: {}", e);
            }
        }
    }

    fn on_audio_sample(&self, left: i16, right: i16) {
        self.audio_frames.fetch_add(1, Ordering::Relaxed);
        self.audio.submit(&[left, right]);
    }

    fn on_audio_batch(&self, samples: &[i16]) -> usize {
        let frames = samples.len() / 2;
        self.audio_frames.fetch_add(frames as u64, Ordering::Relaxed);
        self.audio.submit(samples);
        frames
    }

    fn on_input_poll(&self) {}

    fn on_input_state(&self, _port: u32, _device: u32, _index: u32, id: u32) -> i16 {
        self.input.state(id)
    }
}

/// Convert a path to the NUL-terminated form a core expects
pub(crate) fn path_to_cstring(path: &Path) -> Result<CString> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path
        .to_str()
        .ok_or_else(|| HostError::InvalidPath(path.to_path_buf()))?
        .as_bytes()
        .to_vec();

    CString::new(bytes).map_err(|_| HostError::InvalidPath(path.to_path_buf()))
}
