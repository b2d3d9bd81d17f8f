//! cpal audio output
//!
//! Plays a [`SampleQueue`] on the default output device. The device callback
//! pulls stereo frames from the queue and fills any shortfall with silence.

use crate::queue::SampleQueue;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::Arc;

/// Output sample type
pub type AudioSample = f32;

/// Live output stream on the default device
pub struct CpalAudioOutput {
    stream: Stream,
    sample_rate: u32,
    channels: u16,
}

impl CpalAudioOutput {
    /// Open the default output device and start draining `queue`
    pub fn start(queue: Arc<SampleQueue>, volume: f32) -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("No output device available")?;

        tracing::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| format!("Failed to get output config: {}", e))?;

        tracing::info!("Audio config: {:?}", config);

        let stream_config: StreamConfig = config.into();
        let channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate.0;
        let volume = volume.clamp(0.0, 1.0);

        let mut scratch: Vec<i16> = Vec::new();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [AudioSample], _: &cpal::OutputCallbackInfo| {
                    fill_output(&queue, &mut scratch, data, channels as usize, volume);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| format!("Failed to build output stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to play stream: {}", e))?;

        tracing::info!("Audio stream started ({} Hz, {} channels)", sample_rate, channels);

        Ok(Self {
            stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            tracing::warn!("Failed to pause stream: {}", e);
        }
        tracing::info!("Audio stream stopped");
    }
}

/// Fill a device buffer of `channels`-wide frames from stereo queue data
fn fill_output(
    queue: &SampleQueue,
    scratch: &mut Vec<i16>,
    data: &mut [AudioSample],
    channels: usize,
    volume: f32,
) {
    if channels == 0 {
        return;
    }
    let frames = data.len() / channels;
    scratch.resize(frames * 2, 0);
    let got = queue.drain_into(scratch) / 2;

    let scale = volume / i16::MAX as f32;
    for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
        if i >= got {
            frame.fill(0.0);
            continue;
        }
        let left = scratch[i * 2] as f32 * scale;
        let right = scratch[i * 2 + 1] as f32 * scale;
        match frame {
            [mono] => *mono = (left + right) * 0.5,
            [l, r, rest @ ..] => {
                *l = left;
                *r = right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}
