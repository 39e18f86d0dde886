//! Display interleaver: asynchronous output above a live input line.
//!
//! Invariant: every byte reaches the terminal through `OutputGate::flush(..)`, and each public
//! operation flushes at most once.

use std::io;

use crate::core::editor_component::{EditOutcome, EditState, EditorComponent};
use crate::core::input_event::parse_input_events;
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::core::text::utils::scrub_control_chars;

const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Plain,
    /// Bold, used for lines that mention the local user.
    Highlight,
    /// Dimmed, used for local-only notices.
    Notice,
}

impl LineStyle {
    fn wrap(self, text: &str) -> String {
        match self {
            LineStyle::Plain => text.to_string(),
            LineStyle::Highlight => format!("\x1b[1m{text}\x1b[22m"),
            LineStyle::Notice => format!("\x1b[2m{text}\x1b[22m"),
        }
    }
}

/// Owns the terminal and the input widget while a chat is on screen.
pub struct Display<T: Terminal, E: EditorComponent> {
    terminal: T,
    editor: E,
    output: OutputGate,
    stopped: bool,
}

impl<T: Terminal, E: EditorComponent> Display<T, E> {
    pub fn new(terminal: T, editor: E) -> Self {
        Self {
            terminal,
            editor,
            output: OutputGate::new(),
            stopped: true,
        }
    }

    pub fn start(&mut self) -> io::Result<()> {
        self.output.clear();
        self.terminal.start()?;
        self.stopped = false;

        self.output.push(TerminalCmd::BracketedPasteEnable);
        self.push_redraw();
        self.flush()
    }

    /// Blank the input line, turn protocols off and give the terminal back in cooked mode.
    /// Safe to call more than once.
    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        self.output.push(TerminalCmd::ClearLine);
        self.output.push(TerminalCmd::BracketedPasteDisable);
        self.output.push(TerminalCmd::ShowCursor);
        let flushed = self.output.flush(&mut self.terminal);

        self.terminal
            .drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
        let stopped = self.terminal.stop();
        flushed.and(stopped)
    }

    pub fn is_started(&self) -> bool {
        !self.stopped
    }

    /// Print `text` above the input line. The buffer and cursor are left exactly as they were.
    /// Control characters in `text` are replaced, so remote content can't drive the terminal.
    pub fn print_async(&mut self, text: &str) -> io::Result<()> {
        self.print_styled(text, LineStyle::Plain)
    }

    /// Local-only line (command feedback, errors) rendered dimmed.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.print_styled(text, LineStyle::Notice)
    }

    pub fn print_styled(&mut self, text: &str, style: LineStyle) -> io::Result<()> {
        let state = self.editor.capture_state();
        let prompt = self.editor.prompt().to_string();

        self.output.push(TerminalCmd::HideCursor);
        self.editor.set_prompt("");
        self.editor.restore(EditState::default());
        self.push_redraw();

        self.output
            .push(TerminalCmd::Bytes(style.wrap(&scrub_control_chars(text))));
        self.output.push(TerminalCmd::NewLine);

        self.editor.set_prompt(&prompt);
        self.editor.restore(state);
        self.push_redraw();
        self.output.push(TerminalCmd::ShowCursor);
        self.flush()
    }

    /// Audible mention alert.
    pub fn alert(&mut self) -> io::Result<()> {
        self.output.push(TerminalCmd::Bell);
        self.flush()
    }

    pub fn redraw(&mut self) -> io::Result<()> {
        self.push_redraw();
        self.flush()
    }

    /// Redraw at the new width if the terminal was resized since the last check.
    pub fn sync_size(&mut self) -> io::Result<bool> {
        if !self.terminal.take_resize() {
            return Ok(false);
        }
        tracing::debug!(columns = self.terminal.columns(), "terminal resized");
        self.redraw()?;
        Ok(true)
    }

    pub fn input_ready(&mut self) -> io::Result<bool> {
        self.terminal.input_ready()
    }

    /// Read one pending input sequence and feed it to the editor.
    pub fn read_and_handle(&mut self) -> io::Result<Vec<EditOutcome>> {
        match self.terminal.read_input()? {
            Some(data) => self.handle_input(&data),
            None => Ok(Vec::new()),
        }
    }

    /// Feed raw input to the editor, redrawing once if anything changed. Returns the outcomes
    /// the caller has to act on (submissions, interrupt, end of input).
    pub fn handle_input(&mut self, data: &str) -> io::Result<Vec<EditOutcome>> {
        let mut dirty = false;
        let mut actions = Vec::new();
        for event in parse_input_events(data) {
            match self.editor.handle_event(&event) {
                EditOutcome::Unchanged => {}
                EditOutcome::Changed => dirty = true,
                outcome @ EditOutcome::Submitted(_) => {
                    dirty = true;
                    actions.push(outcome);
                }
                outcome => actions.push(outcome),
            }
        }

        if dirty {
            self.redraw()?;
        }
        Ok(actions)
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    fn push_redraw(&mut self) {
        let width = usize::from(self.terminal.columns()).max(1);
        let line = self.editor.render_line(width);
        self.output.push(TerminalCmd::ClearLine);
        self.output.push(TerminalCmd::Bytes(line.text));
        self.output.push(TerminalCmd::MoveToColumn(line.cursor_col));
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush(&mut self.terminal)
    }
}

impl<T: Terminal, E: EditorComponent> Drop for Display<T, E> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        // Best-effort cleanup: never panic in Drop (especially during unwind).
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}
