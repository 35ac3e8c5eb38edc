//! Eye and mouth glyph bitmaps
//!
//! Each eye is two 5x8 cells wide (left half, right half). The mouth is
//! three cells. Rows are top to bottom, low five bits used.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Glyph slot of the left half of the left eye; the eye pair uses 0..=3
pub const LEFT_EYE_SLOT: u8 = 0;
/// Glyph slot of the left half of the right eye
pub const RIGHT_EYE_SLOT: u8 = 2;
/// First of the three mouth slots
pub const MOUTH_SLOT: u8 = 4;

type EyeCells = [[u8; 8]; 2];
type MouthCells = [[u8; 8]; 3];

/// Eye shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Eye {
    /// Pupil centered
    Center,
    /// Pupil shifted left
    Left,
    /// Pupil shifted right
    Right,
    /// Closed line
    Blink,
    /// Crescent
    Happy,
    /// Wide outline with filled pupil
    Surprised,
    /// Lid drooping over the top half
    Sleepy,
    /// Closed arc, used for winking
    WinkShut,
}

impl Eye {
    /// All shapes, in declaration order
    pub const ALL: [Eye; 8] = [
        Eye::Center,
        Eye::Left,
        Eye::Right,
        Eye::Blink,
        Eye::Happy,
        Eye::Surprised,
        Eye::Sleepy,
        Eye::WinkShut,
    ];

    /// Two-cell bitmap for this shape
    pub fn cells(self) -> &'static EyeCells {
        match self {
            Eye::Center => &[
                [0x0F, 0x10, 0x10, 0x13, 0x13, 0x10, 0x10, 0x0F],
                [0x1E, 0x01, 0x01, 0x19, 0x19, 0x01, 0x01, 0x1E],
            ],
            Eye::Left => &[
                [0x0F, 0x10, 0x10, 0x16, 0x16, 0x10, 0x10, 0x0F],
                [0x1E, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x1E],
            ],
            Eye::Right => &[
                [0x0F, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x0F],
                [0x1E, 0x01, 0x01, 0x0D, 0x0D, 0x01, 0x01, 0x1E],
            ],
            Eye::Blink => &[
                [0x00, 0x00, 0x00, 0x0F, 0x0F, 0x00, 0x00, 0x00],
                [0x00, 0x00, 0x00, 0x1E, 0x1E, 0x00, 0x00, 0x00],
            ],
            Eye::Happy => &[
                [0x0F, 0x10, 0x10, 0x10, 0x08, 0x07, 0x00, 0x00],
                [0x1E, 0x01, 0x01, 0x01, 0x02, 0x1C, 0x00, 0x00],
            ],
            Eye::Surprised => &[
                [0x0F, 0x10, 0x14, 0x17, 0x17, 0x14, 0x10, 0x0F],
                [0x1E, 0x01, 0x05, 0x1D, 0x1D, 0x05, 0x01, 0x1E],
            ],
            Eye::Sleepy => &[
                [0x00, 0x00, 0x00, 0x00, 0x0F, 0x10, 0x10, 0x0F],
                [0x00, 0x00, 0x00, 0x00, 0x1E, 0x01, 0x01, 0x1E],
            ],
            Eye::WinkShut => &[
                [0x00, 0x00, 0x0F, 0x10, 0x08, 0x07, 0x00, 0x00],
                [0x00, 0x00, 0x1E, 0x01, 0x02, 0x1C, 0x00, 0x00],
            ],
        }
    }

    /// Mouth that goes with this eye when nothing overrides it
    pub fn default_mouth(self) -> Mouth {
        match self {
            Eye::Happy | Eye::WinkShut => Mouth::Smile,
            Eye::Surprised => Mouth::Open,
            Eye::Center | Eye::Left | Eye::Right | Eye::Blink | Eye::Sleepy => Mouth::Neutral,
        }
    }

    /// Parse a configuration name such as `"wink_shut"`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "center" => Some(Eye::Center),
            "left" => Some(Eye::Left),
            "right" => Some(Eye::Right),
            "blink" => Some(Eye::Blink),
            "happy" => Some(Eye::Happy),
            "surprised" => Some(Eye::Surprised),
            "sleepy" => Some(Eye::Sleepy),
            "wink_shut" => Some(Eye::WinkShut),
            _ => None,
        }
    }
}

/// Mouth shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mouth {
    /// Flat line
    Neutral,
    /// Curved up
    Smile,
    /// Oval, used while a clip plays
    Open,
}

impl Mouth {
    /// Three-cell bitmap for this shape
    pub fn cells(self) -> &'static MouthCells {
        match self {
            Mouth::Neutral => &[
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00],
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F, 0x00],
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x00],
            ],
            Mouth::Smile => &[
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x1C],
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x08, 0x07],
            ],
            Mouth::Open => &[
                [0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x02, 0x01],
                [0x00, 0x00, 0x00, 0x0E, 0x11, 0x00, 0x00, 0x11],
                [0x00, 0x00, 0x00, 0x00, 0x10, 0x08, 0x08, 0x10],
            ],
        }
    }
}
