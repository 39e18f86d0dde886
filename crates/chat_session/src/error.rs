use std::io;

use chat_log::{CursorError, LogError};
use thiserror::Error;

use crate::identity::NickError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("internal cursor fault: {0}")]
    Cursor(#[from] CursorError),

    #[error("invalid nick: {0}")]
    Nick(#[from] NickError),

    #[error("terminal error while {operation}: {source}")]
    Terminal {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to set up debug logging: {0}")]
    Logging(#[source] io::Error),
}

impl SessionError {
    #[must_use]
    pub fn terminal(operation: &'static str, source: io::Error) -> Self {
        Self::Terminal { operation, source }
    }
}
