//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes must flow through `OutputGate::flush(..)`.

use std::io;

use crate::core::terminal::Terminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences (UTF-8 string) to be written to the terminal.
    Bytes(String),

    /// Return to column 0 and erase the whole line.
    ClearLine,
    /// Raw-mode line break (output post-processing is off, so `\n` alone won't return).
    NewLine,
    /// Return to column 0, then move right by `n` columns.
    MoveToColumn(usize),

    /// Audible alert.
    Bell,

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    /// Protocol toggles.
    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Flush buffered commands to the terminal as a single write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else. Batching keeps a clear/print/redraw sequence from
    /// reaching the terminal in pieces.
    pub fn flush<T: Terminal>(&mut self, term: &mut T) -> io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let mut data = String::new();
        for cmd in self.cmds.drain(..) {
            encode(&cmd, &mut data);
        }
        term.write(&data)
    }
}

fn encode(cmd: &TerminalCmd, out: &mut String) {
    match cmd {
        TerminalCmd::Bytes(data) => out.push_str(data),
        TerminalCmd::ClearLine => out.push_str("\r\x1b[2K"),
        TerminalCmd::NewLine => out.push_str("\r\n"),
        TerminalCmd::MoveToColumn(col) => {
            out.push('\r');
            if *col > 0 {
                out.push_str(&format!("\x1b[{col}C"));
            }
        }
        TerminalCmd::Bell => out.push('\x07'),
        TerminalCmd::HideCursor => out.push_str("\x1b[?25l"),
        TerminalCmd::ShowCursor => out.push_str("\x1b[?25h"),
        TerminalCmd::BracketedPasteEnable => out.push_str("\x1b[?2004h"),
        TerminalCmd::BracketedPasteDisable => out.push_str("\x1b[?2004l"),
    }
}
