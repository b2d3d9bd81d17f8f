//! Shared button table

use parking_lot::Mutex;

/// Number of button ids tracked
pub const INPUT_TABLE_SIZE: usize = 512;

/// Pressed state per button id
///
/// Ids outside `0..INPUT_TABLE_SIZE` are ignored on write and read as
/// released. Port, device and index are not tracked: every query sees the
/// same table.
pub struct InputTable {
    buttons: Mutex<[bool; INPUT_TABLE_SIZE]>,
}

impl InputTable {
    pub fn new() -> Self {
        Self {
            buttons: Mutex::new([false; INPUT_TABLE_SIZE]),
        }
    }

    pub fn set(&self, id: u32, pressed: bool) {
        match self.buttons.lock().get_mut(id as usize) {
            Some(slot) => *slot = pressed,
            None => tracing::trace!("Ignoring out of range button id {}", id),
        }
    }

    pub fn is_pressed(&self, id: u32) -> bool {
        self.buttons.lock().get(id as usize).copied().unwrap_or(false)
    }

    /// Value reported to the core: 1 when pressed, else 0
    pub fn state(&self, id: u32) -> i16 {
        self.is_pressed(id) as i16
    }

    pub fn release_all(&self) {
        self.buttons.lock().fill(false);
    }

    pub fn pressed_count(&self) -> usize {
        self.buttons.lock().iter().filter(|&&p| p).count()
    }
}

impl Default for InputTable {
    fn default() -> Self {
        Self::new()
    }
}
