//! retro-host - headless libretro core runner
//!
//! Loads a core, feeds it one piece of content and runs it for a fixed time
//! against an in-memory frame buffer.

use anyhow::{bail, Context};
use clap::Parser;
use rh_audio::AudioOutput;
use rh_core::{logging, storage, Config};
use rh_input::JoypadButton;
use rh_integration::Frontend;
use rh_video::FrameBuffer;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "retro-host", version, about = "Run a libretro core headlessly")]
struct Args {
    /// Core library; defaults to the first core in the cores directory
    #[arg(long)]
    core: Option<PathBuf>,

    /// Content to load; bare names are looked up in the content directory
    #[arg(long)]
    content: Option<PathBuf>,

    /// Directory reported to the core as its system directory
    #[arg(long)]
    system_dir: Option<PathBuf>,

    /// How long to run the core
    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Discard core audio
    #[arg(long)]
    no_audio: bool,

    /// Only check that the core loads, then exit
    #[arg(long)]
    probe: bool,

    /// Copy the content into the content directory before loading it
    #[arg(long)]
    import: bool,

    /// Joypad button held for the whole run (repeatable)
    #[arg(long, value_name = "BUTTON")]
    hold: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    logging::init(&config.debug)?;

    tracing::info!("Starting retro-host");

    if let Some(dir) = &args.system_dir {
        config.paths.system = Some(dir.clone());
    }
    if args.no_audio {
        config.audio.enable = false;
    }

    let core = match &args.core {
        Some(path) => path.clone(),
        None => storage::find_first_core(&config.paths.cores).with_context(|| {
            format!("No core found in {}", config.paths.cores.display())
        })?,
    };

    if args.probe {
        Frontend::probe_core(&core)?;
        println!("{}: ok", core.display());
        return Ok(());
    }

    let Some(content) = &args.content else {
        bail!("--content is required unless --probe is given");
    };
    let mut content = resolve_content(content, &config)?;
    if args.import && content.parent() != Some(config.paths.content.as_path()) {
        storage::ensure_dir(&config.paths.content)?;
        content = storage::import_file(&content, &config.paths.content)?;
    }

    let held = args
        .hold
        .iter()
        .map(|name| JoypadButton::from_name(name).with_context(|| format!("Unknown button: {}", name)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let audio = AudioOutput::open(&config.audio);
    let mut frontend = Frontend::with_audio_sink(config, audio.sink())?;

    frontend
        .load_core(&core)
        .with_context(|| format!("Failed to load core {}", core.display()))?;

    let fb = FrameBuffer::new().with_max_dimension(frontend.config().video.max_dimension);
    let frames = fb.handle();
    frontend.attach_surface(Box::new(fb));

    frontend.load_game(&content)?;

    for button in &held {
        frontend.set_button_state(button.id(), true);
    }

    if frontend.config().general.auto_start {
        frontend.start_emulation()?;
        std::thread::sleep(Duration::from_secs(args.seconds));
        frontend.stop_emulation();
    } else {
        tracing::info!("Auto start disabled, content loaded but not run");
    }

    let stats = frontend.stats();
    let (width, height) = frames.dimensions();
    if let Some(path) = frontend.core_path() {
        println!("core:             {}", path.display());
    }
    println!("run steps:        {}", stats.run_steps);
    println!("frames presented: {}", stats.frames_presented);
    println!("frames dropped:   {}", stats.frames_dropped);
    println!("audio frames:     {}", stats.audio_frames);
    println!("last frame:       {}x{} ({:?})", width, height, frontend.pixel_format());
    if let Some(queue) = audio.queue() {
        println!("audio queued:     {} samples, {} dropped", queue.len(), queue.dropped_samples());
    }
    if let Some((rate, channels)) = audio.device_format() {
        println!("audio device:     {} Hz, {} channels", rate, channels);
    }

    frontend.unload_core();
    Ok(())
}

/// Use `content` as given when it exists, else look it up by name
fn resolve_content(content: &Path, config: &Config) -> anyhow::Result<PathBuf> {
    if content.exists() {
        return Ok(content.to_path_buf());
    }
    let name = content
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid content path {}", content.display()))?;
    storage::find_content(&config.paths.content, name).with_context(|| {
        format!(
            "Content {} not found (also searched {})",
            content.display(),
            config.paths.content.display()
        )
    })
}
