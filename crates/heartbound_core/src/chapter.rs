use std::fmt;

use serde::{Deserialize, Serialize};

pub const CHAPTER_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Chapter {
    Global,
    Hometown,
    Tower,
    Animus,
    Jotunheim,
    End,
}

impl Chapter {
    pub const ALL: [Chapter; CHAPTER_COUNT] = [
        Self::Global,
        Self::Hometown,
        Self::Tower,
        Self::Animus,
        Self::Jotunheim,
        Self::End,
    ];

    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    pub fn raw(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Global => "Global",
            Self::Hometown => "Hometown",
            Self::Tower => "The Tower",
            Self::Animus => "Animus",
            Self::Jotunheim => "Jotunheim",
            Self::End => "End",
        }
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
