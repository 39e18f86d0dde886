use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::cursor::ReadCursor;
use crate::error::LogError;
use crate::record::{format_line, Record};

/// Complete lines read past a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBatch {
    /// Lines without their terminating newline, in file order.
    pub lines: Vec<String>,
    /// Offset just past the last complete line, or the cursor's own offset if none.
    pub next_offset: u64,
    /// File length at the time of the read, partial trailing line included.
    pub observed_len: u64,
}

/// Handle on the shared append-only log.
///
/// Writes go through `O_APPEND`, so concurrent writers on a local filesystem never
/// interleave inside a line. Reads only ever return newline-terminated lines.
pub struct LogStore {
    path: PathBuf,
    file: File,
}

impl LogStore {
    /// Open `path` for reading and appending, creating it if missing.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let path = path.to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| LogError::io("opening log file", &path, source))?;
        tracing::debug!(path = %path.display(), "opened shared log");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> Result<u64, LogError> {
        self.file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|source| LogError::io("reading log length", &self.path, source))
    }

    pub fn is_empty(&self) -> Result<bool, LogError> {
        Ok(self.len()? == 0)
    }

    /// Whether the file is longer than `observed` bytes.
    pub fn has_grown(&self, observed: u64) -> Result<bool, LogError> {
        Ok(self.len()? > observed)
    }

    /// Append `record` as one line stamped with the current UTC time.
    pub fn append(&mut self, record: &Record) -> Result<(), LogError> {
        self.append_at(record, OffsetDateTime::now_utc())
    }

    pub fn append_at(&mut self, record: &Record, at: OffsetDateTime) -> Result<(), LogError> {
        let mut line = format_line(record, at)?;
        line.push('\n');
        // One write call per record keeps the line contiguous under O_APPEND.
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| LogError::io("appending to log", &self.path, source))?;
        tracing::debug!(bytes = line.len(), "appended record");
        Ok(())
    }

    /// Every complete line after `cursor`. A trailing line without its newline is left for a
    /// later call; `next_offset` never goes past it.
    pub fn read_since(&mut self, cursor: &ReadCursor) -> Result<ReadBatch, LogError> {
        let start = cursor.offset();
        let len = self.len()?;
        if len < start {
            return Err(LogError::Shrunk {
                path: self.path.clone(),
                cursor: start,
                len,
            });
        }
        if len == start {
            return Ok(ReadBatch {
                lines: Vec::new(),
                next_offset: start,
                observed_len: len,
            });
        }

        self.file
            .seek(SeekFrom::Start(start))
            .map_err(|source| LogError::io("seeking in log", &self.path, source))?;
        let mut bytes = Vec::new();
        (&mut self.file)
            .take(len - start)
            .read_to_end(&mut bytes)
            .map_err(|source| LogError::io("reading log", &self.path, source))?;

        let complete = match bytes.iter().rposition(|byte| *byte == b'\n') {
            Some(last_newline) => &bytes[..=last_newline],
            None => &[][..],
        };
        let lines: Vec<String> = complete
            .split(|byte| *byte == b'\n')
            .take(complete.iter().filter(|byte| **byte == b'\n').count())
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect();

        let next_offset = start + complete.len() as u64;
        if next_offset < start + bytes.len() as u64 {
            tracing::trace!(
                pending = start + bytes.len() as u64 - next_offset,
                "partial trailing line left unread"
            );
        }
        tracing::debug!(lines = lines.len(), from = start, to = next_offset, "read log");

        Ok(ReadBatch {
            lines,
            next_offset,
            observed_len: start + bytes.len() as u64,
        })
    }
}
