//! Bounded sample queue between the core and an output device

use crate::sink::AudioSink;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-capacity FIFO of interleaved stereo samples
///
/// When full, the oldest samples are discarded so the producer never waits.
pub struct SampleQueue {
    samples: Mutex<VecDeque<i16>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl SampleQueue {
    /// Create a queue holding up to `frames` stereo frames
    pub fn new(frames: usize) -> Self {
        let capacity = frames.max(1) * 2;
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, input: &[i16]) {
        let mut samples = self.samples.lock();

        // Only the newest `capacity` samples of `input` can survive
        let input = if input.len() > self.capacity {
            let skipped = input.len() - self.capacity;
            self.dropped.fetch_add(skipped as u64, Ordering::Relaxed);
            &input[skipped..]
        } else {
            input
        };

        let overflow = (samples.len() + input.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            samples.drain(..overflow);
            self.dropped.fetch_add(overflow as u64, Ordering::Relaxed);
        }
        samples.extend(input.iter().copied());
    }

    /// Move up to `out.len()` samples into `out`, returning how many were written
    pub fn drain_into(&self, out: &mut [i16]) -> usize {
        let mut samples = self.samples.lock();
        let count = out.len().min(samples.len());
        for (slot, sample) in out.iter_mut().zip(samples.drain(..count)) {
            *slot = sample;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples discarded because the queue was full
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl AudioSink for SampleQueue {
    fn submit(&self, samples: &[i16]) {
        self.push(samples);
    }
}
