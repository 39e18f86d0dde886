//! Terminal trait and lifecycle helpers.

use std::io;

/// Minimal terminal interface for a single-threaded, polled runtime.
///
/// Nothing here blocks: input is discovered with zero-timeout readiness checks and
/// drained one decoded sequence at a time.
pub trait Terminal {
    /// Enter raw mode and begin tracking resizes.
    fn start(&mut self) -> io::Result<()>;

    /// Leave raw mode and restore the original terminal state.
    fn stop(&mut self) -> io::Result<()>;

    /// Discard pending stdin before exiting so stray bytes don't leak to the shell.
    fn drain_input(&mut self, max_ms: u64, idle_ms: u64);

    /// Whether at least one input sequence can be read right now.
    fn input_ready(&mut self) -> io::Result<bool>;

    /// Next complete input sequence, or `None` when nothing is available.
    fn read_input(&mut self) -> io::Result<Option<String>>;

    /// Returns `true` once per terminal resize observed since the last call.
    fn take_resize(&mut self) -> bool;

    /// Write output to the terminal.
    fn write(&mut self, data: &str) -> io::Result<()>;

    /// Terminal width in columns.
    fn columns(&self) -> u16;
}
