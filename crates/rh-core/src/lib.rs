//! Core types for the retro-host libretro frontend
//!
//! This crate provides the foundational error types, configuration,
//! logging and storage helpers shared by every other crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::Config;
pub use error::{CoreLoadError, FrameError, HostError, Result, SurfaceError};
