//! Key parsing for legacy (xterm/VT) terminal input.
//!
//! The runtime never enables the kitty keyboard protocol, so every key arrives either as a
//! single byte, an ESC-prefixed byte (alt), or a CSI/SS3 sequence.

/// Normalized key identifier for a raw input sequence, e.g. `"enter"`, `"ctrl+w"`,
/// `"alt+left"`. Returns `None` for printable text and unrecognized sequences.
pub fn parse_key(data: &str) -> Option<String> {
    if let Some(key_id) = legacy_sequence_key_id(data) {
        return Some(key_id.to_string());
    }

    match data {
        "\x1b" => return Some("escape".to_string()),
        "\t" => return Some("tab".to_string()),
        "\r" | "\n" | "\x1bOM" => return Some("enter".to_string()),
        "\x7f" | "\x08" => return Some("backspace".to_string()),
        "\x00" => return Some("ctrl+space".to_string()),
        "\x1b[Z" => return Some("shift+tab".to_string()),
        "\x1b\r" => return Some("alt+enter".to_string()),
        "\x1b\x7f" | "\x1b\x08" => return Some("alt+backspace".to_string()),
        _ => {}
    }

    let bytes = data.as_bytes();
    if bytes.len() == 2 && bytes[0] == 0x1b {
        let code = bytes[1];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+alt+{}", (code + 96) as char));
        }
        if code.is_ascii_lowercase() {
            return Some(format!("alt+{}", code as char));
        }
    }

    if bytes.len() == 1 && (1..=26).contains(&bytes[0]) {
        return Some(format!("ctrl+{}", (bytes[0] + 96) as char));
    }

    None
}

/// Decoded text for a sequence made only of printable characters.
pub fn parse_text(data: &str) -> Option<String> {
    if data.is_empty() || data.chars().any(char::is_control) {
        return None;
    }
    Some(data.to_string())
}

fn legacy_sequence_key_id(data: &str) -> Option<&'static str> {
    match data {
        "\x1b[A" | "\x1bOA" => Some("up"),
        "\x1b[B" | "\x1bOB" => Some("down"),
        "\x1b[C" | "\x1bOC" => Some("right"),
        "\x1b[D" | "\x1bOD" => Some("left"),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Some("home"),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Some("end"),
        "\x1b[3~" => Some("delete"),
        "\x1b[1;5C" | "\x1bOc" => Some("ctrl+right"),
        "\x1b[1;5D" | "\x1bOd" => Some("ctrl+left"),
        "\x1b[1;3C" | "\x1bf" | "\x1bF" => Some("alt+right"),
        "\x1b[1;3D" | "\x1bb" | "\x1bB" => Some("alt+left"),
        "\x1b[3;3~" => Some("alt+delete"),
        _ => None,
    }
}
