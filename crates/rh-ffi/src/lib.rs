//! libretro boundary for retro-host
//!
//! Everything that touches raw pointers or foreign function pointers lives in
//! this crate. The rest of the workspace only sees [`CoreModule`], a typed,
//! null-free handle, and the [`CoreCallbacks`] capability set.

pub mod abi;
pub mod callbacks;
pub mod module;
pub mod symbols;

pub use callbacks::{CoreCallbacks, EnvCommand, RawFrame, SlotGuard};
pub use module::CoreModule;
pub use symbols::{CoreSymbols, REQUIRED_SYMBOLS};
