//! Stdin escape-sequence buffering.
//!
//! Raw reads can split an escape sequence (or a multi-byte UTF-8 character) across chunks.
//! `StdinBuffer` holds incomplete tails until the rest arrives or a short timeout passes, and
//! peels bracketed paste payloads off as single events.

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;
const BRACKETED_PASTE_START: &str = "\x1b[200~";
const BRACKETED_PASTE_END: &str = "\x1b[201~";

pub const DEFAULT_ESCAPE_TIMEOUT_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinEvent {
    Data(String),
    Paste(String),
}

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
    NotEscape,
}

#[derive(Debug)]
struct SequenceSplit {
    sequences: Vec<String>,
    remainder: String,
}

/// Buffers stdin input and emits complete sequences.
pub struct StdinBuffer {
    buffer: String,
    /// Trailing bytes of a UTF-8 character that hasn't fully arrived yet.
    utf8_tail: Vec<u8>,
    timeout_ms: u64,
    paste_mode: bool,
    paste_buffer: String,
    flush_deadline: Option<Instant>,
}

impl Default for StdinBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_TIMEOUT_MS)
    }
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            buffer: String::new(),
            utf8_tail: Vec::new(),
            timeout_ms,
            paste_mode: false,
            paste_buffer: String::new(),
            flush_deadline: None,
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<StdinEvent> {
        self.flush_deadline = None;

        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(data);
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                // Incomplete character at the end; keep it for the next read.
                let valid = err.valid_up_to();
                self.utf8_tail = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        if text.is_empty() {
            return Vec::new();
        }

        self.process_str(&text)
    }

    /// Whether a buffered incomplete sequence has waited long enough to be flushed verbatim.
    pub fn has_due(&self, now: Instant) -> bool {
        !self.buffer.is_empty() && self.flush_deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn flush_due(&mut self, now: Instant) -> Vec<StdinEvent> {
        if self.buffer.is_empty() {
            self.flush_deadline = None;
            return Vec::new();
        }

        if self.has_due(now) {
            return self.flush().into_iter().map(StdinEvent::Data).collect();
        }

        Vec::new()
    }

    pub fn flush(&mut self) -> Vec<String> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.buffer)]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.buffer.clear();
        self.utf8_tail.clear();
        self.paste_mode = false;
        self.paste_buffer.clear();
    }

    fn process_str(&mut self, data: &str) -> Vec<StdinEvent> {
        let mut events = Vec::new();
        self.buffer.push_str(data);

        if !self.paste_mode {
            let Some(start_index) = self.buffer.find(BRACKETED_PASTE_START) else {
                let result = extract_complete_sequences(&self.buffer);
                // Incomplete escape tails stay buffered until timeout so bytes are never
                // dropped or reordered; a timeout flush emits them verbatim.
                self.buffer = result.remainder;
                events.extend(result.sequences.into_iter().map(StdinEvent::Data));
                if !self.buffer.is_empty() {
                    self.flush_deadline =
                        Some(Instant::now() + Duration::from_millis(self.timeout_ms));
                }
                return events;
            };

            if start_index > 0 {
                let result = extract_complete_sequences(&self.buffer[..start_index]);
                events.extend(result.sequences.into_iter().map(StdinEvent::Data));
            }
            self.buffer.drain(..start_index + BRACKETED_PASTE_START.len());
            self.paste_mode = true;
        }

        self.paste_buffer.push_str(&self.buffer);
        self.buffer.clear();

        if let Some(end_index) = self.paste_buffer.find(BRACKETED_PASTE_END) {
            let pasted = self.paste_buffer[..end_index].to_string();
            let remaining = self.paste_buffer[end_index + BRACKETED_PASTE_END.len()..].to_string();

            self.paste_mode = false;
            self.paste_buffer.clear();
            events.push(StdinEvent::Paste(pasted));

            if !remaining.is_empty() {
                events.extend(self.process_str(&remaining));
            }
        }

        events
    }
}

fn extract_complete_sequences(buffer: &str) -> SequenceSplit {
    let mut sequences = Vec::new();
    let mut pos = 0;
    let bytes = buffer.as_bytes();

    while pos < bytes.len() {
        if bytes[pos] != ESC {
            let Some(ch) = buffer[pos..].chars().next() else {
                break;
            };
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }

        let mut seq_end = pos + 1;
        let mut completed = false;
        while seq_end <= bytes.len() {
            if !buffer.is_char_boundary(seq_end) {
                seq_end += 1;
                continue;
            }
            let candidate = &buffer[pos..seq_end];
            match is_complete_sequence(candidate) {
                SequenceStatus::Incomplete => seq_end += 1,
                SequenceStatus::Complete | SequenceStatus::NotEscape => {
                    sequences.push(candidate.to_string());
                    pos = seq_end;
                    completed = true;
                    break;
                }
            }
        }

        if !completed {
            return SequenceSplit {
                sequences,
                remainder: buffer[pos..].to_string(),
            };
        }
    }

    SequenceSplit {
        sequences,
        remainder: String::new(),
    }
}

fn is_complete_sequence(data: &str) -> SequenceStatus {
    if !data.starts_with('\x1b') {
        return SequenceStatus::NotEscape;
    }

    let after = &data[1..];
    if after.is_empty() {
        return SequenceStatus::Incomplete;
    }

    if after.starts_with('[') {
        return is_complete_csi_sequence(data);
    }

    if after.starts_with(']') {
        return if data.ends_with("\x1b\\") || data.ends_with('\x07') {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }

    if after.starts_with('O') {
        return if after.len() >= 2 {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }

    SequenceStatus::Complete
}

fn is_complete_csi_sequence(data: &str) -> SequenceStatus {
    if data.len() < 3 {
        return SequenceStatus::Incomplete;
    }

    match data.as_bytes().last() {
        Some(last) if (0x40..=0x7e).contains(last) => SequenceStatus::Complete,
        _ => SequenceStatus::Incomplete,
    }
}

#[cfg(test)]
mod tests {
    use super::{StdinBuffer, StdinEvent};
    use std::time::{Duration, Instant};

    fn data(text: &str) -> StdinEvent {
        StdinEvent::Data(text.to_string())
    }

    #[test]
    fn splits_partial_sequences() {
        let mut buffer = StdinBuffer::new(10);

        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.process(b"[1;5").is_empty());
        assert_eq!(buffer.process(b"D"), vec![data("\x1b[1;5D")]);
    }

    #[test]
    fn plain_text_splits_into_characters() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(
            buffer.process("hé\r".as_bytes()),
            vec![data("h"), data("é"), data("\r")]
        );
    }

    #[test]
    fn multibyte_character_split_across_reads_is_reassembled() {
        let mut buffer = StdinBuffer::new(10);
        let bytes = "é".as_bytes();

        assert!(buffer.process(&bytes[..1]).is_empty());
        assert_eq!(buffer.process(&bytes[1..]), vec![data("é")]);
    }

    #[test]
    fn lone_escape_flushes_after_timeout() {
        let mut buffer = StdinBuffer::new(10);

        assert!(buffer.process(b"\x1b").is_empty());
        let now = Instant::now();
        assert!(!buffer.has_due(now));
        assert!(buffer.flush_due(now).is_empty());

        let later = now + Duration::from_millis(25);
        assert!(buffer.has_due(later));
        assert_eq!(buffer.flush_due(later), vec![data("\x1b")]);
        assert!(
            buffer.flush_due(later + Duration::from_millis(25)).is_empty(),
            "flush after deadline should be idempotent"
        );
    }

    #[test]
    fn ss3_split_waits_for_final_byte() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1bO").is_empty());
        assert_eq!(buffer.process(b"A"), vec![data("\x1bOA")]);
    }

    #[test]
    fn paste_split_across_chunks_is_one_event() {
        let mut buffer = StdinBuffer::new(10);
        let mut events = Vec::new();

        events.extend(buffer.process(b"a\x1b[200~hel"));
        events.extend(buffer.process(b"lo\nwor"));
        events.extend(buffer.process(b"ld\x1b[201~b"));

        assert_eq!(
            events,
            vec![
                data("a"),
                StdinEvent::Paste("hello\nworld".to_string()),
                data("b"),
            ]
        );
    }

    #[test]
    fn clear_drops_pending_tail_and_deadline() {
        let mut buffer = StdinBuffer::new(0);
        assert!(buffer.process(b"\x1b[").is_empty());

        buffer.clear();
        assert!(buffer.flush().is_empty());
        assert!(!buffer.has_due(Instant::now() + Duration::from_millis(5)));
    }
}
