//! Session controller: one participant attached to a shared log.
//!
//! A session owns the log handle, its read cursor, the display and the running flag. Nothing
//! here is process-global, so several sessions can share a process (the tests run two).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_log::{LogStore, ReadCursor, Record};
use tailchat_tui::{
    tick, Display, EditOutcome, EnvConfig, LineInput, LineStyle, Pacer, Terminal, TickOutcome,
    TickSources, Ticker,
};

use crate::commands::{parse_submission, Command, Submission};
use crate::error::SessionError;
use crate::identity::Nick;
use crate::mention::is_mentioned;

const NICK_USAGE: &str = "usage: /nick <name>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Joining,
    Active,
    Leaving,
    Closed,
}

/// Shutdown request shared between the loop and signal registration.
///
/// The session is running until a stop is requested; it never restarts.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
    stop_requested: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Flag for `signal_hook::flag::register`, which sets it to `true` on delivery.
    pub fn signal_target(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_requested)
    }
}

pub struct Session<T: Terminal, P: Pacer> {
    chat: Chat<T>,
    ticker: Ticker<P>,
    state: SessionState,
}

struct Chat<T: Terminal> {
    store: LogStore,
    cursor: ReadCursor,
    /// Log length at the last read; the feed is ready once the file outgrows it.
    observed_len: u64,
    nick: Nick,
    display: Display<T, LineInput>,
    bell: bool,
    run: RunFlag,
}

impl<T: Terminal, P: Pacer> Session<T, P> {
    /// Attach to the log at `path` and announce `nick`.
    ///
    /// The cursor starts at the current end of file, so earlier history is never shown. Nothing
    /// is written to the log unless the terminal came up.
    pub fn join(
        path: &Path,
        nick: Nick,
        terminal: T,
        pacer: P,
        config: &EnvConfig,
        run: RunFlag,
    ) -> Result<Self, SessionError> {
        let store = LogStore::open(path)?;
        let start = store.len()?;

        let mut display = Display::new(terminal, LineInput::default());
        display
            .start()
            .map_err(|source| SessionError::terminal("starting the terminal", source))?;

        let mut chat = Chat {
            store,
            cursor: ReadCursor::at(start),
            observed_len: start,
            nick,
            display,
            bell: config.bell,
            run,
        };
        chat.store.append(&Record::joined(chat.nick.as_str()))?;
        tracing::info!(nick = %chat.nick, path = %path.display(), offset = start, "joined");

        Ok(Self {
            chat,
            ticker: Ticker::new(config.tick_interval(), pacer),
            state: SessionState::Active,
        })
    }

    /// Run the input/log multiplexer until the running flag is cleared.
    pub fn run(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Ok(());
        }
        let run = self.chat.run.clone();
        self.ticker.run_until(&mut self.chat, |_| run.is_running())
    }

    /// One non-blocking pass over the keyboard and the log.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        tick(&mut self.chat)
    }

    /// Announce departure. Only the first call writes.
    pub fn leave(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Ok(());
        }
        self.state = SessionState::Leaving;
        self.chat
            .store
            .append(&Record::left(self.chat.nick.as_str()))?;
        tracing::info!(nick = %self.chat.nick, "left");
        Ok(())
    }

    /// Give the terminal back. Safe to call more than once; dropping the session does the same.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Closed;
        self.chat
            .display
            .stop()
            .map_err(|source| SessionError::terminal("restoring the terminal", source))
    }

    /// Leave and give the terminal back once `run` has returned `ran`.
    ///
    /// After a clean stop a failed terminal restore is only logged: the usual cause is a tty that
    /// hung up, and the chat itself ended as asked.
    pub fn finish(&mut self, ran: Result<(), SessionError>) -> Result<(), SessionError> {
        let left = self.leave();
        let closed = self.close();
        match (ran, closed) {
            (Ok(()), Err(err)) => {
                tracing::warn!(error = %err, "terminal restore failed after a clean stop");
                left
            }
            (ran, closed) => ran.and(left).and(closed),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn nick(&self) -> &Nick {
        &self.chat.nick
    }

    pub fn cursor(&self) -> ReadCursor {
        self.chat.cursor
    }

    pub fn run_flag(&self) -> &RunFlag {
        &self.chat.run
    }

    pub fn is_running(&self) -> bool {
        self.chat.run.is_running()
    }

    pub fn display(&self) -> &Display<T, LineInput> {
        &self.chat.display
    }
}

impl<T: Terminal> Chat<T> {
    fn handle_outcome(&mut self, outcome: EditOutcome) -> Result<(), SessionError> {
        match outcome {
            EditOutcome::Submitted(line) => self.submit(&line),
            EditOutcome::Interrupt | EditOutcome::EndOfInput => {
                tracing::debug!(?outcome, "stop requested from keyboard");
                self.run.request_stop();
                Ok(())
            }
            EditOutcome::Unchanged | EditOutcome::Changed => Ok(()),
        }
    }

    fn submit(&mut self, line: &str) -> Result<(), SessionError> {
        match parse_submission(line) {
            Submission::Blank => Ok(()),
            Submission::Message(body) => {
                self.store
                    .append(&Record::message(self.nick.as_str(), body))?;
                Ok(())
            }
            Submission::Command(Command::Quit) => {
                self.run.request_stop();
                Ok(())
            }
            Submission::Command(Command::Nick(None)) => self.notice(NICK_USAGE),
            Submission::Command(Command::Nick(Some(name))) => self.rename(&name),
            Submission::Command(Command::Unknown(name)) => {
                self.notice(&format!("unknown command: {name}"))
            }
        }
    }

    fn rename(&mut self, name: &str) -> Result<(), SessionError> {
        let new = match Nick::parse(name) {
            Ok(new) => new,
            Err(err) => return self.notice(&format!("invalid nick {name:?}: {err}")),
        };
        if new == self.nick {
            return self.notice(&format!("you are already {new}"));
        }

        self.store
            .append(&Record::renamed(self.nick.as_str(), new.as_str()))?;
        tracing::info!(old = %self.nick, new = %new, "renamed");
        self.nick = new;
        Ok(())
    }

    /// Show every complete line past the cursor, then move the cursor past them.
    fn show_new_lines(&mut self) -> Result<(), SessionError> {
        let batch = self.store.read_since(&self.cursor)?;
        tracing::debug!(
            lines = batch.lines.len(),
            from = self.cursor.offset(),
            to = batch.next_offset,
            "log grew"
        );

        for line in &batch.lines {
            if is_mentioned(line, self.nick.as_str()) {
                if self.bell {
                    self.display
                        .alert()
                        .map_err(|source| SessionError::terminal("ringing the bell", source))?;
                }
                self.display
                    .print_styled(line, LineStyle::Highlight)
                    .map_err(|source| SessionError::terminal("printing a line", source))?;
            } else {
                self.display
                    .print_async(line)
                    .map_err(|source| SessionError::terminal("printing a line", source))?;
            }
        }

        self.cursor.advance(batch.next_offset)?;
        self.observed_len = batch.observed_len;
        Ok(())
    }

    fn notice(&mut self, text: &str) -> Result<(), SessionError> {
        self.display
            .notice(text)
            .map_err(|source| SessionError::terminal("printing a notice", source))
    }
}

impl<T: Terminal> TickSources for Chat<T> {
    type Error = SessionError;

    fn before_tick(&mut self) -> Result<(), Self::Error> {
        self.display
            .sync_size()
            .map(|_| ())
            .map_err(|source| SessionError::terminal("redrawing after resize", source))
    }

    fn input_ready(&mut self) -> Result<bool, Self::Error> {
        self.display
            .input_ready()
            .map_err(|source| SessionError::terminal("polling input", source))
    }

    fn feed_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.store.has_grown(self.observed_len)?)
    }

    fn on_input(&mut self) -> Result<(), Self::Error> {
        let outcomes = match self.display.read_and_handle() {
            Ok(outcomes) => outcomes,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("input closed");
                self.run.request_stop();
                return Ok(());
            }
            Err(source) => return Err(SessionError::terminal("reading input", source)),
        };

        for outcome in outcomes {
            if !self.run.is_running() {
                break;
            }
            self.handle_outcome(outcome)?;
        }
        Ok(())
    }

    fn on_feed(&mut self) -> Result<(), Self::Error> {
        self.show_new_lines()
    }
}
