#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chat_session::{Nick, RunFlag, Session};
use tailchat_tui::{EnvConfig, Pacer, Terminal};

/// Everything a session did to its terminal, plus the input still waiting to be read.
#[derive(Default)]
pub struct TerminalTrace {
    pub writes: Vec<String>,
    pub input: VecDeque<String>,
    pub eof: bool,
    pub resized: bool,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub drain_calls: Vec<(u64, u64)>,
    pub fail_start: bool,
    /// Every write fails, as on a tty that hung up.
    pub fail_writes: bool,
}

impl TerminalTrace {
    pub fn output(&self) -> String {
        self.writes.concat()
    }
}

pub struct SharedTerminal {
    state: Arc<Mutex<TerminalTrace>>,
    columns: u16,
}

impl SharedTerminal {
    pub fn new(columns: u16) -> (Self, Arc<Mutex<TerminalTrace>>) {
        let state = Arc::new(Mutex::new(TerminalTrace::default()));
        (
            Self {
                state: Arc::clone(&state),
                columns,
            },
            state,
        )
    }
}

impl Terminal for SharedTerminal {
    fn start(&mut self) -> io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        if state.fail_start {
            return Err(io::Error::other("not a tty"));
        }
        state.start_calls += 1;
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        lock_unpoisoned(&self.state).stop_calls += 1;
        Ok(())
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        let mut state = lock_unpoisoned(&self.state);
        state.drain_calls.push((max_ms, idle_ms));
        state.input.clear();
    }

    fn input_ready(&mut self) -> io::Result<bool> {
        let state = lock_unpoisoned(&self.state);
        Ok(!state.input.is_empty() || state.eof)
    }

    fn read_input(&mut self) -> io::Result<Option<String>> {
        let mut state = lock_unpoisoned(&self.state);
        match state.input.pop_front() {
            Some(data) => Ok(Some(data)),
            None if state.eof => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            None => Ok(None),
        }
    }

    fn take_resize(&mut self) -> bool {
        std::mem::take(&mut lock_unpoisoned(&self.state).resized)
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        if state.fail_writes {
            return Err(io::Error::other("terminal hung up"));
        }
        state.writes.push(data.to_string());
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }
}

/// Records idle pauses instead of sleeping.
#[derive(Default)]
pub struct CountingPacer {
    pub pauses: usize,
}

impl Pacer for CountingPacer {
    fn pause(&mut self, _interval: Duration) {
        self.pauses += 1;
    }
}

pub type TestSession = Session<SharedTerminal, CountingPacer>;

pub fn join(path: &Path, nick: &str, config: &EnvConfig) -> (TestSession, Arc<Mutex<TerminalTrace>>) {
    let (terminal, trace) = SharedTerminal::new(80);
    let nick = Nick::parse(nick).expect("test nick");
    let session = Session::join(
        path,
        nick,
        terminal,
        CountingPacer::default(),
        config,
        RunFlag::new(),
    )
    .expect("join");
    (session, trace)
}

/// Queue `text` followed by Enter, one sequence per read as the stdin buffer delivers them.
pub fn type_line(state: &Arc<Mutex<TerminalTrace>>, text: &str) {
    let mut state = lock_unpoisoned(state);
    if !text.is_empty() {
        state.input.push_back(text.to_string());
    }
    state.input.push_back("\r".to_string());
}

pub fn press(state: &Arc<Mutex<TerminalTrace>>, key: &str) {
    lock_unpoisoned(state).input.push_back(key.to_string());
}

/// Tick until a pass finds nothing to do.
pub fn settle(session: &mut TestSession) {
    for _ in 0..64 {
        if session.tick().expect("tick") == tailchat_tui::TickOutcome::Idle {
            return;
        }
    }
    panic!("session never went idle");
}

pub fn clear_output(state: &Arc<Mutex<TerminalTrace>>) {
    lock_unpoisoned(state).writes.clear();
}

pub fn output(state: &Arc<Mutex<TerminalTrace>>) -> String {
    lock_unpoisoned(state).output()
}

/// Lines printed above the prompt, styling included. Each one is drawn right after the prompt
/// line is cleared to an empty prompt.
pub fn printed_lines(state: &Arc<Mutex<TerminalTrace>>) -> Vec<String> {
    const EMPTY_PROMPT: &str = "\r\x1b[2K\r";
    let out = output(state);
    out.split(EMPTY_PROMPT)
        .skip(1)
        .filter_map(|chunk| chunk.split_once("\r\n").map(|(line, _)| line.to_string()))
        .collect()
}

pub fn read_log(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Strip the `[YYYY-MM-DD HH:MM:SS] ` prefix, asserting it is well formed.
pub fn without_stamp(line: &str) -> &str {
    let bytes = line.as_bytes();
    assert!(line.len() > 22, "line too short for a timestamp: {line:?}");
    assert_eq!(bytes[0], b'[', "{line:?}");
    assert_eq!(&line[20..22], "] ", "{line:?}");
    for (idx, byte) in bytes[1..20].iter().enumerate() {
        match idx {
            4 | 7 => assert_eq!(*byte, b'-', "{line:?}"),
            10 => assert_eq!(*byte, b' ', "{line:?}"),
            13 | 16 => assert_eq!(*byte, b':', "{line:?}"),
            _ => assert!(byte.is_ascii_digit(), "{line:?}"),
        }
    }
    &line[22..]
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
