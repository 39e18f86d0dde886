//! Line editor keybindings.

use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    CursorLeft,
    CursorRight,
    CursorWordLeft,
    CursorWordRight,
    CursorLineStart,
    CursorLineEnd,
    DeleteCharBackward,
    DeleteCharForward,
    DeleteWordBackward,
    DeleteToLineStart,
    DeleteToLineEnd,
    Submit,
    /// Interrupt the session (raw mode swallows SIGINT, so Ctrl+C arrives as a key).
    Interrupt,
    /// End of input when the line is empty; forward delete otherwise.
    EndOfInput,
    /// Recall the previous (older) submitted line.
    HistoryPrev,
    /// Step back toward the newest line, then to the draft.
    HistoryNext,
}

pub type KeyId = String;

pub static DEFAULT_EDITOR_KEYBINDINGS: LazyLock<HashMap<EditorAction, Vec<KeyId>>> =
    LazyLock::new(|| {
        use EditorAction::*;

        let bindings: [(EditorAction, &[&str]); 16] = [
            (CursorLeft, &["left", "ctrl+b"]),
            (CursorRight, &["right", "ctrl+f"]),
            (CursorWordLeft, &["alt+left", "ctrl+left"]),
            (CursorWordRight, &["alt+right", "ctrl+right"]),
            (CursorLineStart, &["home", "ctrl+a"]),
            (CursorLineEnd, &["end", "ctrl+e"]),
            (DeleteCharBackward, &["backspace"]),
            (DeleteCharForward, &["delete"]),
            (DeleteWordBackward, &["ctrl+w", "alt+backspace"]),
            (DeleteToLineStart, &["ctrl+u"]),
            (DeleteToLineEnd, &["ctrl+k"]),
            (Submit, &["enter"]),
            (Interrupt, &["ctrl+c"]),
            (EndOfInput, &["ctrl+d"]),
            (HistoryPrev, &["up"]),
            (HistoryNext, &["down"]),
        ];

        bindings
            .into_iter()
            .map(|(action, keys)| (action, keys.iter().map(|key| key.to_string()).collect()))
            .collect()
    });

#[derive(Debug, Clone)]
pub struct EditorKeybindings {
    action_to_keys: HashMap<EditorAction, Vec<KeyId>>,
}

impl Default for EditorKeybindings {
    fn default() -> Self {
        Self {
            action_to_keys: (*DEFAULT_EDITOR_KEYBINDINGS).clone(),
        }
    }
}

impl EditorKeybindings {
    /// First action bound to `key_id`, checked in a fixed priority order.
    pub fn action_for(&self, key_id: &str) -> Option<EditorAction> {
        use EditorAction::*;

        const ORDER: [EditorAction; 16] = [
            Interrupt,
            Submit,
            EndOfInput,
            DeleteCharBackward,
            DeleteCharForward,
            DeleteWordBackward,
            DeleteToLineStart,
            DeleteToLineEnd,
            CursorWordLeft,
            CursorWordRight,
            CursorLeft,
            CursorRight,
            CursorLineStart,
            CursorLineEnd,
            HistoryPrev,
            HistoryNext,
        ];

        ORDER.into_iter().find(|action| self.matches(key_id, *action))
    }

    pub fn matches(&self, key_id: &str, action: EditorAction) -> bool {
        self.action_to_keys
            .get(&action)
            .is_some_and(|keys| keys.iter().any(|key| key.eq_ignore_ascii_case(key_id)))
    }
}
