//! Audio backend selection

use crate::queue::SampleQueue;
use crate::sink::{AudioSink, NullAudioSink};
use rh_core::config::{AudioBackend, AudioConfig};
use std::sync::Arc;

/// The sink handed to a frontend plus whatever keeps playback alive
pub struct AudioOutput {
    sink: Arc<dyn AudioSink>,
    queue: Option<Arc<SampleQueue>>,
    #[cfg(feature = "cpal")]
    device: Option<crate::cpal_backend::CpalAudioOutput>,
}

impl AudioOutput {
    /// Build the output described by `config`
    ///
    /// `Auto` tries the device (with the `cpal` feature) and falls back to a
    /// bare queue when no device can be opened.
    pub fn open(config: &AudioConfig) -> Self {
        if !config.enable || config.backend == AudioBackend::Null {
            tracing::info!("Audio output disabled");
            return Self::null();
        }

        let queue = Arc::new(SampleQueue::new(config.queue_frames));

        #[cfg(feature = "cpal")]
        let device = if config.backend == AudioBackend::Auto {
            match crate::cpal_backend::CpalAudioOutput::start(Arc::clone(&queue), config.volume) {
                Ok(device) => Some(device),
                Err(e) => {
                    tracing::warn!("Audio device unavailable, queueing only: {}", e);
                    None
                }
            }
        } else {
            None
        };

        tracing::info!("Audio queue holds {} frames", config.queue_frames);

        Self {
            sink: queue.clone(),
            queue: Some(queue),
            #[cfg(feature = "cpal")]
            device,
        }
    }

    /// Output that discards all audio
    pub fn null() -> Self {
        Self {
            sink: Arc::new(NullAudioSink),
            queue: None,
            #[cfg(feature = "cpal")]
            device: None,
        }
    }

    pub fn sink(&self) -> Arc<dyn AudioSink> {
        Arc::clone(&self.sink)
    }

    /// Sample queue behind the sink, if audio is being kept
    pub fn queue(&self) -> Option<&Arc<SampleQueue>> {
        self.queue.as_ref()
    }

    pub fn has_device(&self) -> bool {
        self.device_format().is_some()
    }

    /// Sample rate and channel count of the playing device
    #[cfg(feature = "cpal")]
    pub fn device_format(&self) -> Option<(u32, u16)> {
        self.device
            .as_ref()
            .map(|device| (device.sample_rate(), device.channels()))
    }

    #[cfg(not(feature = "cpal"))]
    pub fn device_format(&self) -> Option<(u32, u16)> {
        None
    }
}

#[cfg(feature = "cpal")]
impl Drop for AudioOutput {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            device.stop();
        }
    }
}
