use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} shrank to {len} bytes, behind the read cursor at {cursor}")]
    Shrunk { path: PathBuf, cursor: u64, len: u64 },

    #[error("failed to format log timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl LogError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("read cursor cannot move backward from {current} to {requested}")]
    Backward { current: u64, requested: u64 },
}
