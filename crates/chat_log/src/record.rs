use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::LogError;

/// One entry of the shared log, before it's stamped and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `[ts] <speaker> body`
    Message { speaker: String, body: String },
    /// `[ts] *** speaker text`
    Status { speaker: String, text: String },
}

impl Record {
    pub fn message(speaker: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Message {
            speaker: speaker.into(),
            body: body.into(),
        }
    }

    pub fn joined(speaker: impl Into<String>) -> Self {
        Self::status(speaker, "joined")
    }

    pub fn left(speaker: impl Into<String>) -> Self {
        Self::status(speaker, "left")
    }

    pub fn renamed(old: impl Into<String>, new: &str) -> Self {
        Self::status(old, format!("is now known as {new}"))
    }

    fn status(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Status {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Render `record` as one log line (no trailing newline), stamped with `at` in UTC.
///
/// Line breaks inside fields become spaces so a record never spans lines.
pub fn format_line(record: &Record, at: OffsetDateTime) -> Result<String, LogError> {
    let stamp = at
        .to_offset(time::UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(LogError::ClockFormat)?;

    let line = match record {
        Record::Message { speaker, body } => {
            format!("[{stamp}] <{}> {}", single_line(speaker), single_line(body))
        }
        Record::Status { speaker, text } => {
            format!("[{stamp}] *** {} {}", single_line(speaker), single_line(text))
        }
    };
    Ok(line)
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
