use std::io::{Read, Seek, SeekFrom};

use crate::core_api::CoreError;

use super::{ROOM_ID_MAX_LEN, SAVE_LINE_COUNT, SEED_MAX_DIGITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Seed,
    RoomId,
    Coordinate,
    Digits,
}

impl LineClass {
    fn for_line(index: usize) -> Self {
        match index {
            0 => Self::Seed,
            1 => Self::RoomId,
            2 | 3 => Self::Coordinate,
            _ => Self::Digits,
        }
    }

    fn accepts(self, b: u8) -> bool {
        match self {
            Self::Seed | Self::Digits => b.is_ascii_digit(),
            Self::RoomId => b.is_ascii_alphanumeric() || b == b'_',
            Self::Coordinate => b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'),
        }
    }

    fn max_len(self) -> Option<usize> {
        match self {
            Self::Seed => Some(SEED_MAX_DIGITS),
            Self::RoomId => Some(ROOM_ID_MAX_LEN),
            Self::Coordinate | Self::Digits => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Seed => "seed digits",
            Self::RoomId => "room id characters",
            Self::Coordinate => "coordinate characters",
            Self::Digits => "digits",
        }
    }
}

/// Classify the remaining bytes of `reader` as a save file, then seek back to
/// where the reader started.
pub fn validate<R: Read + Seek>(reader: &mut R) -> Result<(), CoreError> {
    let start = reader
        .stream_position()
        .map_err(|e| CoreError::corrupted(format!("save stream is not seekable: {e}")))?;

    let mut bytes = Vec::new();
    let read = reader
        .read_to_end(&mut bytes)
        .map_err(|e| CoreError::corrupted(format!("failed to read save stream: {e}")));
    let rewind = reader
        .seek(SeekFrom::Start(start))
        .map_err(|e| CoreError::corrupted(format!("failed to rewind save stream: {e}")));

    read?;
    rewind?;
    validate_bytes(&bytes)
}

/// Check every line against its character class and the fixed line count.
pub fn validate_bytes(bytes: &[u8]) -> Result<(), CoreError> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    if body.is_empty() {
        return Err(CoreError::corrupted("save file is empty"));
    }

    let mut count = 0usize;
    for (index, raw) in body.split(|&b| b == b'\n').enumerate() {
        if index >= SAVE_LINE_COUNT {
            return Err(CoreError::corrupted(format!(
                "save file has more than {SAVE_LINE_COUNT} lines"
            )));
        }
        check_line(index, raw)?;
        count += 1;
    }

    if count != SAVE_LINE_COUNT {
        return Err(CoreError::corrupted(format!(
            "save file has {count} lines, expected {SAVE_LINE_COUNT}"
        )));
    }
    Ok(())
}

fn check_line(index: usize, raw: &[u8]) -> Result<(), CoreError> {
    let class = LineClass::for_line(index);
    let cleaned: Vec<u8> = raw.iter().copied().filter(|&b| b != b'\r').collect();
    let token = trim_spaces(&cleaned);

    if token.is_empty() {
        return Err(CoreError::corrupted(format!("line {} is blank", index + 1)));
    }
    if let Some(&bad) = token.iter().find(|&&b| !class.accepts(b)) {
        return Err(CoreError::corrupted(format!(
            "line {} contains {:?}, expected {}",
            index + 1,
            char::from(bad),
            class.describe()
        )));
    }
    if let Some(max) = class.max_len()
        && token.len() > max
    {
        return Err(CoreError::corrupted(format!(
            "line {} is {} characters long, at most {max} allowed",
            index + 1,
            token.len()
        )));
    }
    Ok(())
}

fn trim_spaces(mut token: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = token {
        if *first != b' ' {
            break;
        }
        token = rest;
    }
    while let [rest @ .., last] = token {
        if *last != b' ' {
            break;
        }
        token = rest;
    }
    token
}
