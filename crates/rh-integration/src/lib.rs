//! Core integration layer for retro-host
//!
//! Ties the libretro boundary to the host: the [`Session`] answers core
//! callbacks, the [`ExecutionLoop`] drives `retro_run`, and the [`Frontend`]
//! orders the whole lifecycle.

pub mod frontend;
pub mod runner;
pub mod session;

pub use frontend::{Frontend, FrontendState, FrontendStats};
pub use runner::{ExecutionLoop, LoopState};
pub use session::{Session, SessionStats};
