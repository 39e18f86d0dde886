/// What a submitted input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nothing but whitespace; ignored.
    Blank,
    Message(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// `/nick` with the rest of the line, if any.
    Nick(Option<String>),
    Unknown(String),
}

/// Classify a submitted line. Command names match the first whitespace-separated token
/// exactly, so `/quitter` is unknown rather than `/quit`.
pub fn parse_submission(input: &str) -> Submission {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Submission::Blank;
    }
    if !trimmed.starts_with('/') {
        return Submission::Message(input.to_string());
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/quit" => Command::Quit,
        "/nick" if rest.is_empty() => Command::Nick(None),
        "/nick" => Command::Nick(Some(rest.to_string())),
        _ => Command::Unknown(command.to_string()),
    };

    Submission::Command(parsed)
}
