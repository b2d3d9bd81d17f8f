//! Video output for retro-host
//!
//! Converts core frames into 32-bit host pixels and defines the render target
//! contract the frontend draws into.

pub mod convert;
pub mod framebuffer;
pub mod pixel;
pub mod surface;

pub use convert::{convert_frame, rgb565_to_argb8888};
pub use framebuffer::{FrameBuffer, FrameHandle, PresentedFrame};
pub use pixel::PixelFormat;
pub use surface::{present, LockedBuffer, RenderTarget};
