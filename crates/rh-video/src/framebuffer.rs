//! In-memory render target
//!
//! [`FrameBuffer`] keeps a back buffer the converter writes into and copies
//! each posted frame into a shared front buffer. Headless runs and tests read
//! the front buffer through a [`FrameHandle`].

use crate::surface::{LockedBuffer, RenderTarget};
use parking_lot::Mutex;
use rh_core::SurfaceError;
use std::sync::Arc;

/// Last frame posted to a [`FrameBuffer`]
#[derive(Debug, Clone, Default)]
pub struct PresentedFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed `width * height` pixels
    pub pixels: Vec<u32>,
    /// Number of frames posted so far
    pub sequence: u64,
}

impl PresentedFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Raw bytes of row `y`
    pub fn row_bytes(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        let row = self.pixels.get(start..start + self.width as usize)?;
        Some(bytemuck::cast_slice(row))
    }
}

/// Read side of a [`FrameBuffer`]
#[derive(Debug, Clone)]
pub struct FrameHandle {
    front: Arc<Mutex<PresentedFrame>>,
}

impl FrameHandle {
    pub fn snapshot(&self) -> PresentedFrame {
        self.front.lock().clone()
    }

    pub fn frames_posted(&self) -> u64 {
        self.front.lock().sequence
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let front = self.front.lock();
        (front.width, front.height)
    }
}

/// Software render target backed by host memory
pub struct FrameBuffer {
    back: Vec<u32>,
    width: u32,
    height: u32,
    row_padding: usize,
    max_dimension: u32,
    locked: bool,
    front: Arc<Mutex<PresentedFrame>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            back: Vec::new(),
            width: 0,
            height: 0,
            row_padding: 0,
            max_dimension: u32::MAX,
            locked: false,
            front: Arc::new(Mutex::new(PresentedFrame::default())),
        }
    }

    /// Pad every back buffer row by `pixels`, so the stride exceeds the width
    pub fn with_row_padding(mut self, pixels: usize) -> Self {
        self.row_padding = pixels;
        self
    }

    /// Reject geometries wider or taller than `max`
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max;
        self
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            front: Arc::clone(&self.front),
        }
    }

    pub fn stride(&self) -> usize {
        self.width as usize + self.row_padding
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for FrameBuffer {
    fn set_geometry(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension {
            return Err(SurfaceError::Geometry { width, height });
        }
        if (width, height) != (self.width, self.height) {
            tracing::debug!("Frame buffer geometry {}x{}", width, height);
            self.width = width;
            self.height = height;
        }
        self.back.resize(self.stride() * height as usize, 0);
        Ok(())
    }

    fn lock(&mut self) -> Result<LockedBuffer<'_>, SurfaceError> {
        if self.locked {
            return Err(SurfaceError::Lock("frame buffer already locked".to_string()));
        }
        if self.back.is_empty() {
            return Err(SurfaceError::Lock("frame buffer has no geometry".to_string()));
        }
        self.locked = true;
        let stride = self.stride();
        Ok(LockedBuffer {
            pixels: bytemuck::cast_slice_mut(&mut self.back),
            stride,
        })
    }

    fn unlock_and_post(&mut self) -> Result<(), SurfaceError> {
        if !self.locked {
            return Err(SurfaceError::Lock("frame buffer not locked".to_string()));
        }
        self.locked = false;

        let width = self.width as usize;
        let stride = self.stride();
        let mut front = self.front.lock();
        front.width = self.width;
        front.height = self.height;
        front.pixels.clear();
        for row in self.back.chunks_exact(stride) {
            front.pixels.extend_from_slice(&row[..width]);
        }
        front.sequence += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pattern(fb: &mut FrameBuffer) {
        let locked = fb.lock().unwrap();
        let stride = locked.stride;
        let pixels: &mut [u32] = bytemuck::cast_slice_mut(locked.pixels);
        for (i, row) in pixels.chunks_exact_mut(stride).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                *px = (i * 100 + x) as u32;
            }
        }
    }

    #[test]
    fn test_post_strips_row_padding() {
        let mut fb = FrameBuffer::new().with_row_padding(3);
        let handle = fb.handle();
        fb.set_geometry(4, 2).unwrap();
        assert_eq!(fb.stride(), 7);

        write_pattern(&mut fb);
        fb.unlock_and_post().unwrap();

        let frame = handle.snapshot();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixels, vec![0, 1, 2, 3, 100, 101, 102, 103]);
        assert_eq!(frame.pixel(3, 1), Some(103));
        assert_eq!(frame.pixel(4, 1), None);
        assert_eq!(frame.row_bytes(0).map(<[u8]>::len), Some(16));
        assert_eq!(handle.frames_posted(), 1);
    }

    #[test]
    fn test_lock_protocol() {
        let mut fb = FrameBuffer::new();
        assert!(fb.lock().is_err());
        assert!(fb.unlock_and_post().is_err());

        fb.set_geometry(2, 2).unwrap();
        let _ = fb.lock().unwrap();
        assert!(fb.lock().is_err());
        fb.unlock_and_post().unwrap();
        assert!(fb.unlock_and_post().is_err());
    }

    #[test]
    fn test_geometry_limits() {
        let mut fb = FrameBuffer::new().with_max_dimension(256);
        assert!(fb.set_geometry(0, 10).is_err());
        assert!(fb.set_geometry(257, 10).is_err());
        fb.set_geometry(256, 224).unwrap();
        fb.set_geometry(160, 144).unwrap();
        let locked = fb.lock().unwrap();
        assert_eq!(locked.stride, 160);
        assert_eq!(locked.pixels.len(), 160 * 144 * 4);
    }
}
