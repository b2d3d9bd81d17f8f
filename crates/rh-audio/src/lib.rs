//! Audio output for retro-host
//!
//! Cores hand over interleaved 16-bit stereo frames from inside their run
//! step. Sinks accept them without blocking; playback, if any, drains a
//! [`SampleQueue`] from the device thread.

pub mod output;
pub mod queue;
pub mod sink;

#[cfg(feature = "cpal")]
pub mod cpal_backend;

pub use output::AudioOutput;
pub use queue::SampleQueue;
pub use sink::{AudioSink, NullAudioSink};
