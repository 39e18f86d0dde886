//! Editor component interface.

use crate::core::input_event::InputEvent;

/// Snapshot of an in-progress line: buffer contents plus cursor position (byte offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    pub buffer: String,
    pub cursor: usize,
}

/// One rendered input row: the text to print and where the hardware cursor belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub text: String,
    pub cursor_col: usize,
}

/// Result of feeding one input event to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    Changed,
    /// A completed line; the editor has already cleared its buffer.
    Submitted(String),
    Interrupt,
    EndOfInput,
}

/// Line editor capability used by the display interleaver.
///
/// The interleaver hides the line while it prints asynchronous output, so it needs to pull
/// the full editing state out and put it back byte-for-byte.
pub trait EditorComponent {
    /// Copy of the current buffer and cursor.
    fn capture_state(&self) -> EditState;

    /// Replace the buffer and cursor. Cursors past the end clamp to the end.
    fn restore(&mut self, state: EditState);

    fn prompt(&self) -> &str;

    fn set_prompt(&mut self, prompt: &str);

    /// Render prompt plus buffer into at most `width` visible columns.
    fn render_line(&self, width: usize) -> RenderedLine;

    fn handle_event(&mut self, event: &InputEvent) -> EditOutcome;
}
