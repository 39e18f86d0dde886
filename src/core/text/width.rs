//! Grapheme width and visible width helpers.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 3;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }

    // Zero-width joiners and combining marks ride on the first char; a grapheme never
    // occupies less than its base character.
    grapheme
        .chars()
        .next()
        .and_then(UnicodeWidthChar::width)
        .unwrap_or(0)
        .max(
            grapheme
                .chars()
                .filter_map(UnicodeWidthChar::width)
                .max()
                .unwrap_or(0),
        )
}

/// Length of the CSI sequence (`ESC [ ... final`) starting at `idx`, if any.
fn csi_len(input: &str, idx: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(idx) != Some(&0x1b) || bytes.get(idx + 1) != Some(&b'[') {
        return None;
    }
    let mut end = idx + 2;
    while let Some(byte) = bytes.get(end) {
        end += 1;
        if (0x40..=0x7e).contains(byte) {
            return Some(end - idx);
        }
    }
    None
}

/// Display width of `input`, ignoring CSI styling sequences.
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }

    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = csi_len(input, idx) {
            idx += len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        clean.push(ch);
        idx += ch.len_utf8();
    }

    clean.graphemes(true).map(grapheme_width).sum()
}
