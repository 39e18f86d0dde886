//! Participant identity.

use std::env::{self, VarError};
use std::fmt;

use thiserror::Error;

pub const MAX_NICK_LEN: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NickError {
    #[error("nick must not be empty")]
    Empty,

    #[error("nick is {len} characters long; the limit is {MAX_NICK_LEN}")]
    TooLong { len: usize },

    #[error("nick may only contain ASCII letters and digits (found {found:?})")]
    InvalidChar { found: char },

    #[error("${var} is not valid unicode")]
    LoginNotUnicode { var: &'static str },

    #[error("no NICK given and neither $USER nor $LOGNAME is set")]
    MissingLogin,
}

/// A validated nick: 1 to 15 ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nick(String);

impl Nick {
    pub fn parse(raw: &str) -> Result<Self, NickError> {
        if raw.is_empty() {
            return Err(NickError::Empty);
        }
        if let Some(found) = raw.chars().find(|ch| !ch.is_ascii_alphanumeric()) {
            return Err(NickError::InvalidChar { found });
        }
        if raw.len() > MAX_NICK_LEN {
            return Err(NickError::TooLong { len: raw.len() });
        }
        Ok(Self(raw.to_string()))
    }

    /// Nick from the login name in `$USER`, falling back to `$LOGNAME`.
    pub fn from_login_env() -> Result<Self, NickError> {
        Self::from_login_with(|key| env::var(key))
    }

    fn from_login_with<F>(lookup: F) -> Result<Self, NickError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        for var in ["USER", "LOGNAME"] {
            match lookup(var) {
                Ok(value) if !value.trim().is_empty() => return Self::parse(value.trim()),
                Ok(_) | Err(VarError::NotPresent) => continue,
                Err(VarError::NotUnicode(_)) => return Err(NickError::LoginNotUnicode { var }),
            }
        }
        Err(NickError::MissingLogin)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nick {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
