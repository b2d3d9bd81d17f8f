//! Core pixel formats

use rh_ffi::abi::{RETRO_PIXEL_FORMAT_RGB565, RETRO_PIXEL_FORMAT_XRGB8888};

/// Pixel encoding a core hands to the video callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 32-bit `0x00RRGGBB` native-endian words, same layout as the host surface
    #[default]
    Xrgb8888,
    /// 16-bit 5-6-5
    Rgb565,
    /// A code the host does not convert; copied as 32-bit rows
    Other(u32),
}

impl PixelFormat {
    pub fn from_raw(code: u32) -> Self {
        match code {
            RETRO_PIXEL_FORMAT_XRGB8888 => Self::Xrgb8888,
            RETRO_PIXEL_FORMAT_RGB565 => Self::Rgb565,
            other => Self::Other(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Xrgb8888 => RETRO_PIXEL_FORMAT_XRGB8888,
            Self::Rgb565 => RETRO_PIXEL_FORMAT_RGB565,
            Self::Other(code) => *code,
        }
    }

    /// Bytes per source pixel as read by the converter
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Xrgb8888 | Self::Other(_) => 4,
        }
    }
}
