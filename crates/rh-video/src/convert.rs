//! Frame conversion into the host's 32-bit surface layout
//!
//! The destination is always native-endian `u32` words of the form
//! `0xAARRGGBB`. Source rows are `pitch` bytes apart, destination rows
//! `stride` pixels apart. Nothing here allocates; the converter runs once per
//! presented frame on the execution loop thread.

use crate::pixel::PixelFormat;
use rh_core::FrameError;

/// Bytes per destination pixel
pub const DST_BYTES_PER_PIXEL: usize = 4;

/// Expand one RGB565 pixel to opaque 32-bit ARGB
///
/// Channels are shifted left without replicating the high bits, so full
/// intensity red maps to `0xF8`, not `0xFF`.
#[inline]
pub fn rgb565_to_argb8888(pixel: u16) -> u32 {
    let pixel = pixel as u32;
    let r = ((pixel >> 11) & 0x1F) << 3;
    let g = ((pixel >> 5) & 0x3F) << 2;
    let b = (pixel & 0x1F) << 3;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

/// Bytes a buffer must hold for `height` rows of `row_bytes`, `pitch` apart
fn required_len(row_bytes: usize, height: usize, pitch: usize) -> usize {
    (height - 1)
        .checked_mul(pitch)
        .and_then(|n| n.checked_add(row_bytes))
        .unwrap_or(usize::MAX)
}

/// Convert a `width` x `height` frame from `src` into `dst`
///
/// `pitch` is the source row length in bytes; `dst_stride` is the
/// destination row length in pixels. Rows are handled one at a time so the
/// two strides may differ. Unknown formats are copied as 32-bit rows.
pub fn convert_frame(
    src: &[u8],
    width: usize,
    height: usize,
    pitch: usize,
    format: PixelFormat,
    dst: &mut [u8],
    dst_stride: usize,
) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Ok(());
    }

    let src_row_bytes = width * format.bytes_per_pixel();
    let needed = required_len(src_row_bytes, height, pitch);
    if src.len() < needed {
        return Err(FrameError::SourceTooSmall {
            needed,
            len: src.len(),
        });
    }

    let dst_row_bytes = width * DST_BYTES_PER_PIXEL;
    let dst_pitch = dst_stride.saturating_mul(DST_BYTES_PER_PIXEL);
    let needed = required_len(dst_row_bytes, height, dst_pitch);
    if dst.len() < needed || dst_stride < width {
        return Err(FrameError::DestinationTooSmall {
            needed,
            len: dst.len(),
        });
    }

    match format {
        PixelFormat::Rgb565 => {
            for y in 0..height {
                let src_row = &src[y * pitch..y * pitch + src_row_bytes];
                let dst_row = &mut dst[y * dst_pitch..y * dst_pitch + dst_row_bytes];
                for (px, out) in src_row
                    .chunks_exact(2)
                    .zip(dst_row.chunks_exact_mut(DST_BYTES_PER_PIXEL))
                {
                    let value = u16::from_ne_bytes([px[0], px[1]]);
                    out.copy_from_slice(&rgb565_to_argb8888(value).to_ne_bytes());
                }
            }
        }
        PixelFormat::Xrgb8888 | PixelFormat::Other(_) => {
            for y in 0..height {
                dst[y * dst_pitch..y * dst_pitch + dst_row_bytes]
                    .copy_from_slice(&src[y * pitch..y * pitch + src_row_bytes]);
            }
        }
    }

    Ok(())
}
