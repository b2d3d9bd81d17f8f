//! Host render target contract

use crate::convert::convert_frame;
use crate::pixel::PixelFormat;
use rh_core::{HostError, Result, SurfaceError};
use rh_ffi::RawFrame;

/// Writable view of a locked render target
pub struct LockedBuffer<'a> {
    /// Raw bytes of the target, 32-bit native-endian pixels
    pub pixels: &'a mut [u8],
    /// Row length in pixels, at least the configured width
    pub stride: usize,
}

/// A surface frames are drawn into
///
/// Implementations are owned by the frontend and only touched from one thread
/// at a time, under the frontend's surface lock.
pub trait RenderTarget: Send {
    /// Resize the target's buffers to `width` x `height`
    fn set_geometry(&mut self, width: u32, height: u32) -> std::result::Result<(), SurfaceError>;

    /// Lock the back buffer for writing
    fn lock(&mut self) -> std::result::Result<LockedBuffer<'_>, SurfaceError>;

    /// Release the lock and make the written frame visible
    fn unlock_and_post(&mut self) -> std::result::Result<(), SurfaceError>;
}

/// Draw one core frame into `target`
///
/// A lock that fails skips the frame. Once the buffer is locked it is always
/// posted again, even when conversion fails.
pub fn present(target: &mut dyn RenderTarget, frame: &RawFrame<'_>, format: PixelFormat) -> Result<()> {
    target.set_geometry(frame.width, frame.height)?;

    let converted = {
        let locked = target.lock()?;
        convert_frame(
            frame.data,
            frame.width as usize,
            frame.height as usize,
            frame.pitch,
            format,
            locked.pixels,
            locked.stride,
        )
    };

    target.unlock_and_post()?;
    converted.map_err(HostError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        buffer: Vec<u8>,
        stride: usize,
        geometry: Option<(u32, u32)>,
        fail_lock: bool,
        posts: u32,
    }

    impl RenderTarget for Recording {
        fn set_geometry(&mut self, width: u32, height: u32) -> std::result::Result<(), SurfaceError> {
            self.geometry = Some((width, height));
            self.stride = width as usize;
            self.buffer = vec![0; width as usize * height as usize * 4];
            Ok(())
        }

        fn lock(&mut self) -> std::result::Result<LockedBuffer<'_>, SurfaceError> {
            if self.fail_lock {
                return Err(SurfaceError::Lock("window gone".to_string()));
            }
            Ok(LockedBuffer {
                pixels: &mut self.buffer,
                stride: self.stride,
            })
        }

        fn unlock_and_post(&mut self) -> std::result::Result<(), SurfaceError> {
            self.posts += 1;
            Ok(())
        }
    }

    #[test]
    fn test_present_sets_geometry_and_posts() {
        let data = [0xAAu8; 16];
        let frame = RawFrame { data: &data, width: 2, height: 2, pitch: 8 };
        let mut target = Recording::default();

        present(&mut target, &frame, PixelFormat::Xrgb8888).unwrap();

        assert_eq!(target.geometry, Some((2, 2)));
        assert_eq!(target.posts, 1);
        assert_eq!(target.buffer, data.to_vec());
    }

    #[test]
    fn test_failed_lock_skips_frame() {
        let data = [0u8; 16];
        let frame = RawFrame { data: &data, width: 2, height: 2, pitch: 8 };
        let mut target = Recording { fail_lock: true, ..Default::default() };

        let err = present(&mut target, &frame, PixelFormat::Xrgb8888).unwrap_err();
        assert!(matches!(err, HostError::Surface(SurfaceError::Lock(_))));
        assert_eq!(target.posts, 0);
    }

    #[test]
    fn test_conversion_error_still_posts() {
        let data = [0u8; 4];
        let frame = RawFrame { data: &data, width: 2, height: 2, pitch: 8 };
        let mut target = Recording::default();

        let err = present(&mut target, &frame, PixelFormat::Xrgb8888).unwrap_err();
        assert!(matches!(err, HostError::Frame(_)));
        assert_eq!(target.posts, 1);
    }
}
