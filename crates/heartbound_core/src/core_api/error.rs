use std::io;
use std::path::Path;

use thiserror::Error;

use crate::keyed_table::TableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    FileNotFound,
    FileCorrupted,
    OutOfMemory,
    WriteFailure,
    InvalidArgument,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::FileCorrupted, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::InvalidArgument, message)
    }

    pub(crate) fn read_failure(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::new(
                CoreErrorCode::FileNotFound,
                format!("file not found: {}", path.display()),
            ),
            io::ErrorKind::OutOfMemory => Self::new(
                CoreErrorCode::OutOfMemory,
                format!("out of memory while reading {}", path.display()),
            ),
            _ => Self::corrupted(format!("failed to read {}: {err}", path.display())),
        }
    }

    pub(crate) fn write_failure(path: &Path, err: &io::Error) -> Self {
        Self::new(
            CoreErrorCode::WriteFailure,
            format!("failed to write {}: {err}", path.display()),
        )
    }
}

impl From<TableError> for CoreError {
    fn from(err: TableError) -> Self {
        Self::new(CoreErrorCode::OutOfMemory, err.to_string())
    }
}
