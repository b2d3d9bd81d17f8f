//! Input handling for retro-host
//!
//! The UI side writes button state, the core reads it from `input_state`
//! during a run step.

pub mod joypad;
pub mod table;

pub use joypad::JoypadButton;
pub use table::{InputTable, INPUT_TABLE_SIZE};
