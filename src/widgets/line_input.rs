//! Single-line input widget.

use crate::core::editor_component::{EditOutcome, EditState, EditorComponent, RenderedLine};
use crate::core::input_event::InputEvent;
use crate::core::keybindings::{EditorAction, EditorKeybindings};
use crate::core::text::utils::{grapheme_segments, is_punctuation_char, is_whitespace_char};
use crate::core::text::width::{grapheme_width, visible_width};

const HISTORY_LIMIT: usize = 100;

/// Single-line input with readline-style editing and horizontal scrolling.
///
/// `cursor` is a byte offset into `value` and always sits on a grapheme boundary.
///
/// Submitted lines are kept newest-first in `history`. While browsing, `history_index` points at
/// the recalled entry and `draft` holds the line that was being typed when browsing began.
pub struct LineInput {
    value: String,
    cursor: usize,
    prompt: String,
    keybindings: EditorKeybindings,
    history: Vec<String>,
    history_index: Option<usize>,
    draft: String,
}

impl Default for LineInput {
    fn default() -> Self {
        Self::new(EditorKeybindings::default())
    }
}

impl LineInput {
    pub fn new(keybindings: EditorKeybindings) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            prompt: "> ".to_string(),
            keybindings,
            history: Vec::new(),
            history_index: None,
            draft: String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Submitted lines, newest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn add_to_history(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if self.history.first().is_some_and(|newest| newest == line) {
            return;
        }
        self.history.insert(0, line.to_string());
        self.history.truncate(HISTORY_LIMIT);
    }

    /// Editing a recalled line makes it the new draft.
    fn stop_browsing(&mut self) {
        self.history_index = None;
        self.draft.clear();
    }

    fn navigate_history(&mut self, older: bool) -> EditOutcome {
        let next = match (self.history_index, older) {
            (None, true) if !self.history.is_empty() => Some(0),
            (Some(idx), true) if idx + 1 < self.history.len() => Some(idx + 1),
            (Some(0), false) => None,
            (Some(idx), false) => Some(idx - 1),
            _ => return EditOutcome::Unchanged,
        };

        if self.history_index.is_none() {
            self.draft = std::mem::take(&mut self.value);
        }
        self.value = match next {
            Some(idx) => self.history.get(idx).cloned().unwrap_or_default(),
            None => std::mem::take(&mut self.draft),
        };
        self.history_index = next;
        self.cursor = self.value.len();
        EditOutcome::Changed
    }

    fn clamp_cursor(&mut self) {
        if self.cursor > self.value.len() {
            self.cursor = self.value.len();
        }
        while self.cursor > 0 && !self.value.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    fn insert_text(&mut self, text: &str) -> EditOutcome {
        if text.is_empty() {
            return EditOutcome::Unchanged;
        }
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.stop_browsing();
        EditOutcome::Changed
    }

    fn handle_paste(&mut self, pasted_text: &str) -> EditOutcome {
        let cleaned: String = pasted_text
            .chars()
            .filter(|ch| *ch != '\r' && *ch != '\n')
            .map(|ch| if ch.is_control() { ' ' } else { ch })
            .collect();
        self.insert_text(&cleaned)
    }

    fn prev_grapheme_len(&self) -> usize {
        grapheme_segments(&self.value[..self.cursor])
            .next_back()
            .map_or(0, str::len)
    }

    fn next_grapheme_len(&self) -> usize {
        grapheme_segments(&self.value[self.cursor..])
            .next()
            .map_or(0, str::len)
    }

    fn is_whitespace_segment(segment: &str) -> bool {
        segment.chars().any(is_whitespace_char)
    }

    fn is_punctuation_segment(segment: &str) -> bool {
        segment.chars().any(is_punctuation_char)
    }

    fn is_word_segment(segment: &str) -> bool {
        !Self::is_whitespace_segment(segment) && !Self::is_punctuation_segment(segment)
    }

    /// Start of the word before the cursor: skip whitespace, then a run of either
    /// punctuation or word characters.
    fn word_start_before_cursor(&self) -> usize {
        let mut graphemes: Vec<&str> = grapheme_segments(&self.value[..self.cursor]).collect();
        let mut pos = self.cursor;

        while let Some(last) = graphemes.last().copied() {
            if !Self::is_whitespace_segment(last) {
                break;
            }
            pos -= last.len();
            graphemes.pop();
        }

        let Some(first) = graphemes.last().copied() else {
            return pos;
        };
        let same_class: fn(&str) -> bool = if Self::is_punctuation_segment(first) {
            Self::is_punctuation_segment
        } else {
            Self::is_word_segment
        };
        while let Some(last) = graphemes.last().copied() {
            if !same_class(last) {
                break;
            }
            pos -= last.len();
            graphemes.pop();
        }
        pos
    }

    fn word_end_after_cursor(&self) -> usize {
        let mut iter = grapheme_segments(&self.value[self.cursor..]).peekable();
        let mut pos = self.cursor;

        while let Some(seg) = iter.peek().copied() {
            if !Self::is_whitespace_segment(seg) {
                break;
            }
            pos += seg.len();
            iter.next();
        }

        let Some(first) = iter.peek().copied() else {
            return pos;
        };
        let same_class: fn(&str) -> bool = if Self::is_punctuation_segment(first) {
            Self::is_punctuation_segment
        } else {
            Self::is_word_segment
        };
        while let Some(seg) = iter.peek().copied() {
            if !same_class(seg) {
                break;
            }
            pos += seg.len();
            iter.next();
        }
        pos
    }

    fn delete_range(&mut self, start: usize, end: usize) -> EditOutcome {
        if start >= end {
            return EditOutcome::Unchanged;
        }
        self.value.replace_range(start..end, "");
        self.cursor = start;
        self.stop_browsing();
        EditOutcome::Changed
    }

    fn move_to(&mut self, pos: usize) -> EditOutcome {
        if pos == self.cursor {
            return EditOutcome::Unchanged;
        }
        self.cursor = pos;
        EditOutcome::Changed
    }

    fn apply(&mut self, action: EditorAction) -> EditOutcome {
        match action {
            EditorAction::Interrupt => EditOutcome::Interrupt,
            EditorAction::Submit => {
                let line = std::mem::take(&mut self.value);
                self.cursor = 0;
                self.stop_browsing();
                self.add_to_history(&line);
                EditOutcome::Submitted(line)
            }
            EditorAction::EndOfInput if self.value.is_empty() => EditOutcome::EndOfInput,
            EditorAction::EndOfInput | EditorAction::DeleteCharForward => {
                let end = self.cursor + self.next_grapheme_len();
                self.delete_range(self.cursor, end)
            }
            EditorAction::DeleteCharBackward => {
                let start = self.cursor - self.prev_grapheme_len();
                self.delete_range(start, self.cursor)
            }
            EditorAction::DeleteWordBackward => {
                let start = self.word_start_before_cursor();
                self.delete_range(start, self.cursor)
            }
            EditorAction::DeleteToLineStart => self.delete_range(0, self.cursor),
            EditorAction::DeleteToLineEnd => self.delete_range(self.cursor, self.value.len()),
            EditorAction::CursorLeft => self.move_to(self.cursor - self.prev_grapheme_len()),
            EditorAction::CursorRight => self.move_to(self.cursor + self.next_grapheme_len()),
            EditorAction::CursorWordLeft => self.move_to(self.word_start_before_cursor()),
            EditorAction::CursorWordRight => self.move_to(self.word_end_after_cursor()),
            EditorAction::CursorLineStart => self.move_to(0),
            EditorAction::CursorLineEnd => self.move_to(self.value.len()),
            EditorAction::HistoryPrev => self.navigate_history(true),
            EditorAction::HistoryNext => self.navigate_history(false),
        }
    }
}

impl EditorComponent for LineInput {
    fn capture_state(&self) -> EditState {
        EditState {
            buffer: self.value.clone(),
            cursor: self.cursor,
        }
    }

    fn restore(&mut self, state: EditState) {
        self.value = state.buffer;
        self.cursor = state.cursor;
        self.clamp_cursor();
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    fn render_line(&self, width: usize) -> RenderedLine {
        let prompt_width = visible_width(&self.prompt);
        let available_width = width.saturating_sub(prompt_width);
        if available_width == 0 {
            return RenderedLine {
                text: self.prompt.clone(),
                cursor_col: prompt_width.min(width.saturating_sub(1)),
            };
        }

        let segments: Vec<(usize, &str, usize)> = grapheme_segments(&self.value)
            .scan(0usize, |offset, seg| {
                let start = *offset;
                *offset += seg.len();
                Some((start, seg, grapheme_width(seg)))
            })
            .collect();
        let total_width: usize = segments.iter().map(|(_, _, w)| w).sum();
        let cursor_col: usize = segments
            .iter()
            .take_while(|(start, _, _)| *start < self.cursor)
            .map(|(_, _, w)| w)
            .sum();

        if total_width < available_width {
            return RenderedLine {
                text: format!("{}{}", self.prompt, self.value),
                cursor_col: prompt_width + cursor_col,
            };
        }

        // Keep one column free for the cursor when it sits past the last grapheme.
        let scroll_width = if self.cursor == self.value.len() {
            available_width.saturating_sub(1)
        } else {
            available_width
        };
        let half_width = scroll_width / 2;
        let window_start = if cursor_col < half_width {
            0
        } else if cursor_col > total_width.saturating_sub(half_width) {
            total_width.saturating_sub(scroll_width)
        } else {
            cursor_col - half_width
        };

        let mut text = self.prompt.clone();
        let mut col = 0;
        let mut shown_start = None;
        for (_, seg, seg_width) in &segments {
            let seg_start = col;
            col += seg_width;
            if seg_start < window_start {
                continue;
            }
            if col > window_start + scroll_width {
                break;
            }
            shown_start.get_or_insert(seg_start);
            text.push_str(seg);
        }
        let shown_start = shown_start.unwrap_or(window_start);

        RenderedLine {
            text,
            cursor_col: prompt_width + cursor_col.saturating_sub(shown_start),
        }
    }

    fn handle_event(&mut self, event: &InputEvent) -> EditOutcome {
        self.clamp_cursor();

        match event {
            InputEvent::Text { text, .. } => self.insert_text(text),
            InputEvent::Paste { text, .. } => self.handle_paste(text),
            InputEvent::Key { key_id, .. } => match self.keybindings.action_for(key_id) {
                Some(action) => self.apply(action),
                None => EditOutcome::Unchanged,
            },
            InputEvent::UnknownRaw { .. } => EditOutcome::Unchanged,
        }
    }
}
