//! Error types for the retro-host frontend

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the frontend
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Core load error: {0}")]
    Load(#[from] CoreLoadError),

    #[error("No core loaded")]
    NoCoreLoaded,

    #[error("No content loaded")]
    NoContentLoaded,

    #[error("Core rejected content: {}", .0.display())]
    ContentRejected(PathBuf),

    #[error("Emulation is running")]
    EmulationRunning,

    #[error("Path is not representable as a C string: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Failed to spawn worker thread: {0}")]
    Thread(#[source] std::io::Error),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Errors raised while opening a core module
#[derive(Error, Debug)]
pub enum CoreLoadError {
    #[error("Failed to open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Missing required symbols: {}", .0.join(", "))]
    MissingSymbols(Vec<&'static str>),

    #[error("Callback slot is owned by another session")]
    CallbackSlotBusy,
}

/// Host render target errors
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Surface rejected geometry {width}x{height}")]
    Geometry { width: u32, height: u32 },

    #[error("Failed to lock surface: {0}")]
    Lock(String),
}

/// Pixel conversion errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("Source buffer too small: need {needed} bytes, have {len}")]
    SourceTooSmall { needed: usize, len: usize },

    #[error("Destination buffer too small: need {needed} bytes, have {len}")]
    DestinationTooSmall { needed: usize, len: usize },
}

/// Result type alias for frontend operations
pub type Result<T> = std::result::Result<T, HostError>;
