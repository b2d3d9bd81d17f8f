//! Audio sink contract

/// Receiver for core audio
///
/// `submit` is called on the execution loop thread and must not block on I/O.
pub trait AudioSink: Send + Sync {
    /// Accept interleaved stereo samples (`[l, r, l, r, ...]`)
    fn submit(&self, samples: &[i16]);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn submit(&self, _samples: &[i16]) {}
}
