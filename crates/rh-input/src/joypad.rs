//! libretro joypad button ids

/// RetroPad buttons, discriminants are the libretro `RETRO_DEVICE_ID_JOYPAD_*` ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum JoypadButton {
    B = 0,
    Y = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    A = 8,
    X = 9,
    L = 10,
    R = 11,
    L2 = 12,
    R2 = 13,
    L3 = 14,
    R3 = 15,
}

impl JoypadButton {
    pub const ALL: [JoypadButton; 16] = [
        Self::B,
        Self::Y,
        Self::Select,
        Self::Start,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::A,
        Self::X,
        Self::L,
        Self::R,
        Self::L2,
        Self::R2,
        Self::L3,
        Self::R3,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Parse a button name as used on the command line and in key maps
    pub fn from_name(name: &str) -> Option<Self> {
        let button = match name.to_ascii_lowercase().as_str() {
            "b" => Self::B,
            "y" => Self::Y,
            "select" => Self::Select,
            "start" => Self::Start,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "a" => Self::A,
            "x" => Self::X,
            "l" => Self::L,
            "r" => Self::R,
            "l2" => Self::L2,
            "r2" => Self::R2,
            "l3" => Self::L3,
            "r3" => Self::R3,
            _ => return None,
        };
        Some(button)
    }
}
