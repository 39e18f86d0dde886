//! Diagnostic logging.
//!
//! The terminal belongs to the chat, so `tracing` output goes to a file or nowhere.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber appending to `path`, filtered by `filter`
/// (`EnvFilter` directive syntax, e.g. `info` or `chat_log=debug`).
pub fn init_file_logging(path: &Path, filter: &str) -> io::Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)
}
