use std::fmt;

use serde::{Deserialize, Serialize};

/// Which glyph alphabets the player can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnownGlyphs {
    None,
    Lightbringer,
    LightbringerAndDarksider,
    Unknown(i64),
}

impl KnownGlyphs {
    pub const NONE_RAW: i64 = 0;
    pub const LIGHTBRINGER_RAW: i64 = 1;
    pub const BOTH_RAW: i64 = 2;

    pub fn from_raw(raw: i64) -> Self {
        match raw {
            Self::NONE_RAW => Self::None,
            Self::LIGHTBRINGER_RAW => Self::Lightbringer,
            Self::BOTH_RAW => Self::LightbringerAndDarksider,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> i64 {
        match *self {
            Self::None => Self::NONE_RAW,
            Self::Lightbringer => Self::LIGHTBRINGER_RAW,
            Self::LightbringerAndDarksider => Self::BOTH_RAW,
            Self::Unknown(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "None",
            Self::Lightbringer => "Lightbringer",
            Self::LightbringerAndDarksider => "Lightbringer and Darksider",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for KnownGlyphs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}
