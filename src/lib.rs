//! Inline terminal runtime for tailchat.
//!
//! Invariant: single output gate — only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - [`Display`] prints asynchronous lines above a live [`LineInput`] without disturbing the
//!   draft being typed.
//! - [`Ticker`] and [`tick`] multiplex keyboard input with any other pollable source on one
//!   thread, pausing only when nothing was ready.
//! - [`ProcessTerminal`] is the raw-mode, `poll(2)`-driven [`Terminal`] for real ttys.

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod runtime;
pub mod widgets;

/// Line editor capability used by the interleaver.
pub use crate::core::editor_component::{EditOutcome, EditState, EditorComponent, RenderedLine};

/// Keybinding configuration and default mappings.
pub use crate::core::keybindings::{
    EditorAction, EditorKeybindings, KeyId, DEFAULT_EDITOR_KEYBINDINGS,
};

/// Keyboard input parsing helpers.
pub use crate::core::input::{parse_key, parse_text};
pub use crate::core::input_event::{parse_input_events, InputEvent};

/// Input buffering for chunked terminal streams.
pub use crate::platform::stdin_buffer::{StdinBuffer, StdinEvent};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::output::{OutputGate, TerminalCmd};
pub use crate::core::terminal::Terminal;
pub use crate::platform::{install_signal_handlers, ProcessTerminal, SignalHookGuard};

/// Runtime loop and interleaved display.
pub use crate::runtime::{
    tick, Display, LineStyle, Pacer, ThreadPacer, TickOutcome, TickSources, Ticker,
};

/// Built-in widgets.
pub use crate::widgets::LineInput;

/// Environment configuration.
pub use crate::config::EnvConfig;

/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
/// Control-character scrubbing for untrusted text.
pub use crate::core::text::utils::scrub_control_chars;
