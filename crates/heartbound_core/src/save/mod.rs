//! Heartbound's line-oriented save file.
//!
//! Layout, one value per line: seed, room id, x, y, current HP, maximum HP,
//! known glyphs, then storyline variables 1 through 999.

pub mod line_reader;
pub mod validator;

use std::fmt::Write as _;
use std::fs;
use std::io::{BufRead, Cursor};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core_api::CoreError;
use crate::fs_util::write_bytes_atomic;
use crate::glyphs::KnownGlyphs;
use line_reader::LineReader;
pub use validator::{validate, validate_bytes};

/// Storyline variable slots, including the unused slot 0.
pub const NUM_STORY_VARS: usize = 1000;
/// Lines that precede storyline variable 1 (player attributes), plus one.
pub const ROW_OFFSET: usize = 7;
pub const SAVE_LINE_COUNT: usize = NUM_STORY_VARS + ROW_OFFSET - 1;
pub const SEED_MAX_DIGITS: usize = 10;
pub const ROOM_ID_MAX_LEN: usize = 49;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub seed: String,
    pub room_id: String,
    pub x: f64,
    pub y: f64,
    pub hp_current: f64,
    pub hp_max: f64,
    pub known_glyphs: KnownGlyphs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveGame {
    pub player: PlayerState,
    /// Indexed by variable number; slot 0 is never read or written.
    pub values: Vec<f64>,
}

impl SaveGame {
    /// Read a save already accepted by [`validate`]. Stops early, leaving the
    /// remaining variables at zero, if the stream runs out.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, CoreError> {
        let mut r = LineReader::new(reader);

        let seed = required(r.read_token(), &r, "seed")?;
        let room_id = required(r.read_token(), &r, "room id")?;
        let x = required(r.read_number(), &r, "x coordinate")?;
        let y = required(r.read_number(), &r, "y coordinate")?;
        let hp_current = required(r.read_number(), &r, "current hit points")?;
        let hp_max = required(r.read_number(), &r, "maximum hit points")?;
        let glyphs = required(r.read_number(), &r, "known glyphs")?;

        let mut values = vec![0.0; NUM_STORY_VARS];
        for slot in values.iter_mut().skip(1) {
            let next = r
                .read_number()
                .map_err(|e| CoreError::corrupted(format!("line {}: {e}", r.line_no() + 1)))?;
            match next {
                Some(value) => *slot = value,
                None => break,
            }
        }
        debug!(lines = r.line_no(), "save parsed");

        Ok(Self {
            player: PlayerState {
                seed,
                room_id,
                x,
                y,
                hp_current,
                hp_max,
                known_glyphs: KnownGlyphs::from_raw(glyphs as i64),
            },
            values,
        })
    }

    /// Validate then parse `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        validate_bytes(bytes)?;
        Self::parse(Cursor::new(bytes))
    }

    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let bytes = fs::read(path).map_err(|e| CoreError::read_failure(path, &e))?;
        let save = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), "opened save");
        Ok(save)
    }

    /// Serialize in file order. Numbers are written with no decimals and a
    /// trailing space, matching the files the game produces.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(SAVE_LINE_COUNT * 4);
        let p = &self.player;

        push_text(&mut out, &p.seed);
        push_text(&mut out, &p.room_id);
        push_number(&mut out, p.x);
        push_number(&mut out, p.y);
        push_number(&mut out, p.hp_current);
        push_number(&mut out, p.hp_max);
        push_number(&mut out, p.known_glyphs.raw() as f64);
        for &value in self.values.iter().skip(1).take(NUM_STORY_VARS - 1) {
            push_number(&mut out, value);
        }
        out.into_bytes()
    }

    /// Replace `path` with this save. The old file survives a failed write.
    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        write_bytes_atomic(path, &self.to_bytes())
            .map_err(|e| CoreError::write_failure(path, &e))?;
        info!(path = %path.display(), "wrote save");
        Ok(())
    }
}

fn required<T>(
    next: std::io::Result<Option<T>>,
    r: &LineReader<impl BufRead>,
    what: &str,
) -> Result<T, CoreError> {
    match next {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(CoreError::corrupted(format!(
            "save ended before the {what} (line {})",
            r.line_no() + 1
        ))),
        Err(e) => Err(CoreError::corrupted(format!(
            "line {}: {e}",
            r.line_no() + 1
        ))),
    }
}

fn push_text(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn push_number(out: &mut String, value: f64) {
    writeln!(out, "{value:.0} ").expect("writing to String cannot fail");
}
