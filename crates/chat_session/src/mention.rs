/// The delimiter that closes `<speaker>` in a message line.
const SPEAKER_DELIMITER: &str = "> ";
/// Opens the body of a status line, `*** speaker text`.
const STATUS_MARKER: &str = "*** ";

/// Whether `line` names `nick` in its content.
///
/// Content is the text after the first `"> "` of a message line, or the text after the
/// speaker field of a status line, so the speaker never mentions themselves by name. The
/// match is a case-sensitive substring with no word-boundary check: `al` matches `always`.
pub fn is_mentioned(line: &str, nick: &str) -> bool {
    if nick.is_empty() {
        return false;
    }
    content(line).is_some_and(|text| text.contains(nick))
}

fn content(line: &str) -> Option<&str> {
    let body = line.split_once("] ").map_or(line, |(_, body)| body);
    if let Some(status) = body.strip_prefix(STATUS_MARKER) {
        return status.split_once(' ').map(|(_, text)| text);
    }
    line.split_once(SPEAKER_DELIMITER).map(|(_, text)| text)
}
