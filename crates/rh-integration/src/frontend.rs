//! Lifecycle controller
//!
//! [`Frontend`] owns one core at a time and enforces the load, init,
//! load-content, start, stop, unload ordering.

use crate::runner::ExecutionLoop;
use crate::session::{path_to_cstring, Session};
use rh_audio::{AudioSink, NullAudioSink};
use rh_core::{Config, HostError, Result};
use rh_ffi::abi::RETRO_API_VERSION;
use rh_ffi::{CoreCallbacks, CoreModule, CoreSymbols, SlotGuard};
use rh_video::{PixelFormat, RenderTarget};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Observable frontend state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendState {
    /// No core loaded
    Empty,
    /// Core loaded and initialised, no content
    CoreLoaded,
    /// Content accepted, loop stopped
    Ready,
    Running,
}

/// Frontend statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontendStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub audio_frames: u64,
    pub run_steps: u64,
}

struct LoadedCore {
    module: CoreModule,
    content: Option<PathBuf>,
    slot: SlotGuard,
}

/// Host-facing control surface for one libretro core
pub struct Frontend {
    config: Config,
    session: Arc<Session>,
    core: Option<LoadedCore>,
    exec: ExecutionLoop,
}

impl Frontend {
    /// Create a frontend that discards core audio
    pub fn new(config: Config) -> Result<Self> {
        Self::with_audio_sink(config, Arc::new(NullAudioSink))
    }

    /// Create a frontend forwarding core audio to `sink`
    pub fn with_audio_sink(config: Config, sink: Arc<dyn AudioSink>) -> Result<Self> {
        tracing::info!("Initializing frontend");

        let session = Arc::new(Session::new(sink, config.video.max_dimension));
        session.set_system_dir(config.paths.system.as_deref())?;

        Ok(Self {
            config,
            session,
            core: None,
            exec: ExecutionLoop::new(),
        })
    }

    /// Load a core from a shared library, replacing any active core
    pub fn load_core(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.unload_core();

        // SAFETY: the caller selects the file and trusts it to be a libretro core.
        let module = unsafe { CoreModule::open(path) }?;
        self.install(module)
    }

    /// Install a statically linked core, replacing any active core
    pub fn load_static_core(&mut self, symbols: CoreSymbols) -> Result<()> {
        self.unload_core();
        self.install(CoreModule::from_symbols(symbols))
    }

    /// Check that `path` is a loadable core without initialising it
    pub fn probe_core(path: impl AsRef<Path>) -> Result<()> {
        // SAFETY: as for `load_core`.
        unsafe { CoreModule::probe(path.as_ref()) }?;
        Ok(())
    }

    fn install(&mut self, module: CoreModule) -> Result<()> {
        let target: Arc<dyn CoreCallbacks> = self.session.clone();
        let slot = SlotGuard::claim(target)?;

        self.session.reset_pixel_format();
        self.session.reset_stats();
        self.exec.reset_steps();

        let version = module.api_version();
        if version != RETRO_API_VERSION {
            tracing::warn!(
                "Core reports API version {}, frontend implements {}",
                version,
                RETRO_API_VERSION
            );
        }

        module.register_callbacks();
        module.init();

        match module.path() {
            Some(path) => tracing::info!("Core loaded: {}", path.display()),
            None => tracing::info!("Static core loaded"),
        }

        self.core = Some(LoadedCore {
            module,
            content: None,
            slot,
        });
        Ok(())
    }

    /// Stop, unload content, deinit and close the active core
    ///
    /// Cannot fail; a no-op when no core is loaded.
    pub fn unload_core(&mut self) {
        self.exec.stop();

        let Some(core) = self.core.take() else {
            self.session.release_retired_dirs();
            return;
        };

        if core.content.is_some() {
            core.module.unload_game();
        }
        core.module.deinit();

        let LoadedCore { module, slot, .. } = core;
        drop(module);
        drop(slot);

        self.session.release_retired_dirs();
        self.session.input().release_all();
        tracing::info!("Core unloaded");
    }

    /// Set the directory reported to cores as the system directory
    pub fn set_system_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        self.session.set_system_dir(Some(path.as_ref()))?;
        self.release_unreachable_dirs();
        Ok(())
    }

    pub fn clear_system_dir(&self) -> Result<()> {
        self.session.set_system_dir(None)?;
        self.release_unreachable_dirs();
        Ok(())
    }

    /// Without a core nothing can hold a replaced string
    fn release_unreachable_dirs(&self) {
        if self.core.is_none() {
            self.session.release_retired_dirs();
        }
    }

    /// Hand content to the active core by path
    ///
    /// A rejection leaves the core loaded with no content.
    pub fn load_game(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let core = self.core.as_mut().ok_or(HostError::NoCoreLoaded)?;
        if self.exec.is_running() {
            return Err(HostError::EmulationRunning);
        }

        let c_path = path_to_cstring(path)?;

        if let Some(previous) = core.content.take() {
            tracing::info!("Unloading content: {}", previous.display());
            core.module.unload_game();
        }

        tracing::info!("Loading content: {}", path.display());
        if !core.module.load_game(&c_path) {
            tracing::warn!("Core rejected content: {}", path.display());
            return Err(HostError::ContentRejected(path.to_path_buf()));
        }

        core.content = Some(path.to_path_buf());
        Ok(())
    }

    /// Start the execution loop; a no-op when already running
    pub fn start_emulation(&mut self) -> Result<()> {
        let core = self.core.as_ref().ok_or(HostError::NoCoreLoaded)?;
        if core.content.is_none() {
            return Err(HostError::NoContentLoaded);
        }

        let run = core.module.run_fn();
        // SAFETY: the loop is always stopped before the module is closed.
        self.exec.start(move || unsafe { run() })
    }

    /// Stop the execution loop and wait for the current step to finish
    ///
    /// Cannot fail; stopping an idle loop does nothing.
    pub fn stop_emulation(&mut self) {
        self.exec.stop();
    }

    /// Bind a render target; allowed while running
    ///
    /// Cannot fail; any previously bound target is released.
    pub fn attach_surface(&self, target: Box<dyn RenderTarget>) {
        tracing::info!("Attaching surface");
        self.session.attach_surface(target);
    }

    /// Stop emulation and release the bound render target
    pub fn detach_surface(&mut self) -> bool {
        self.exec.stop();
        let detached = self.session.detach_surface();
        if detached {
            tracing::info!("Surface detached");
        }
        detached
    }

    pub fn set_button_state(&self, id: u32, pressed: bool) {
        self.session.input().set(id, pressed);
    }

    /// Record the fast-forward toggle; pacing is left to the core
    pub fn set_fast_forward(&self, enabled: bool) {
        tracing::info!("Fast forward {}", if enabled { "enabled" } else { "disabled" });
        self.session.set_fast_forward(enabled);
    }

    pub fn fast_forward(&self) -> bool {
        self.session.fast_forward()
    }

    /// Rewind is not supported; the request is only logged
    pub fn rewind_frames(&self, count: u32) {
        tracing::info!("Rewind of {} frames requested, no savestate history available", count);
    }

    pub fn state(&self) -> FrontendState {
        match &self.core {
            None => FrontendState::Empty,
            Some(_) if self.exec.is_running() => FrontendState::Running,
            Some(core) if core.content.is_some() => FrontendState::Ready,
            Some(_) => FrontendState::CoreLoaded,
        }
    }

    pub fn is_running(&self) -> bool {
        self.exec.is_running()
    }

    pub fn has_core(&self) -> bool {
        self.core.is_some()
    }

    pub fn has_content(&self) -> bool {
        self.core.as_ref().is_some_and(|core| core.content.is_some())
    }

    /// Path of the loaded content, if any
    pub fn content_path(&self) -> Option<&Path> {
        self.core.as_ref()?.content.as_deref()
    }

    /// Path of the loaded core; `None` for static cores or when empty
    pub fn core_path(&self) -> Option<&Path> {
        self.core.as_ref()?.module.path()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.session.pixel_format()
    }

    pub fn system_dir(&self) -> Option<PathBuf> {
        self.session.system_dir()
    }

    pub fn stats(&self) -> FrontendStats {
        let session = self.session.stats();
        FrontendStats {
            frames_presented: session.frames_presented,
            frames_dropped: session.frames_dropped,
            audio_frames: session.audio_frames,
            run_steps: self.exec.steps(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Frontend {
    fn drop(&mut self) {
        self.unload_core();
    }
}
