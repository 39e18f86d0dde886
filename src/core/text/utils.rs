//! Utility helpers.

use unicode_segmentation::UnicodeSegmentation;

pub fn grapheme_segments(text: &str) -> unicode_segmentation::Graphemes<'_> {
    UnicodeSegmentation::graphemes(text, true)
}

pub fn is_whitespace_char(ch: char) -> bool {
    ch.is_whitespace()
}

pub fn is_punctuation_char(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | '<'
            | '>'
            | '.'
            | ','
            | ';'
            | ':'
            | '\''
            | '"'
            | '!'
            | '?'
            | '+'
            | '-'
            | '='
            | '*'
            | '/'
            | '\\'
            | '|'
            | '&'
            | '%'
            | '^'
            | '$'
            | '#'
            | '@'
            | '~'
            | '`'
    )
}

/// Replace control characters (C0, DEL, C1) with U+FFFD so text read from an untrusted
/// source can't move the cursor or switch terminal modes. Tabs are kept.
pub fn scrub_control_chars(text: &str) -> String {
    text.chars()
        .map(|ch| {
            if ch != '\t' && ch.is_control() {
                char::REPLACEMENT_CHARACTER
            } else {
                ch
            }
        })
        .collect()
}
