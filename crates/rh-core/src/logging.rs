//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level so a single run can
//! be traced without editing the config file.

use crate::config::DebugConfig;
use crate::error::{HostError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Build the filter for the given debug settings
pub fn env_filter(debug: &DebugConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug.log_level.as_directive()))
}

/// Install the global tracing subscriber
pub fn init(debug: &DebugConfig) -> Result<()> {
    let filter = env_filter(debug);

    let installed = if debug.log_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&debug.log_path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    installed.map_err(|e| HostError::Config(format!("logging: {}", e)))
}
