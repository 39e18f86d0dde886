//! Process-based terminal implementation.
//!
//! Everything runs on the caller's thread: stdin is probed with zero-timeout `poll(2)` and
//! read only when data is waiting, and signals only flip atomic flags.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::core::terminal::Terminal;
use crate::platform::stdin_buffer::{StdinBuffer, StdinEvent, DEFAULT_ESCAPE_TIMEOUT_MS};

use libc::{self, c_int};
use signal_hook::SigId;

fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }

        return Err(io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(count) => {
                if count > bytes.len() - written {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                written += count;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

/// `poll(2)` for readability. A zero timeout never blocks.
fn poll_readable(fd: c_int, timeout_ms: i32) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        // POLLHUP without POLLIN still means a read will return (EOF), so report it.
        return Ok(result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0);
    }
}

fn read_fd(fd: c_int, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let result = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(result as usize);
    }
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    stdin_buffer: StdinBuffer,
    pending: VecDeque<String>,
    resized: Arc<AtomicBool>,
    resize_sig: Option<SigId>,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            stdin_buffer: StdinBuffer::new(DEFAULT_ESCAPE_TIMEOUT_MS),
            pending: VecDeque::new(),
            resized: Arc::new(AtomicBool::new(false)),
            resize_sig: None,
            write_log_path: None,
            write_log_failed: false,
        }
    }

    /// Mirror every terminal write into `path` (append mode). Failures disable the mirror.
    pub fn with_write_log(mut self, path: Option<PathBuf>) -> Self {
        self.write_log_path = path;
        self
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn queue_events(&mut self, events: Vec<StdinEvent>) {
        for event in events {
            match event {
                StdinEvent::Data(sequence) => self.pending.push_back(sequence),
                StdinEvent::Paste(content) => self
                    .pending
                    .push_back(format!("\x1b[200~{content}\x1b[201~")),
            }
        }
    }

    /// One `read(2)` into the stdin buffer. Only call after a readiness check.
    fn fill_pending(&mut self) -> io::Result<()> {
        let mut buf = [0u8; 4096];
        let read_len = read_fd(self.stdin_fd, &mut buf)?;
        if read_len == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        let events = self.stdin_buffer.process(&buf[..read_len]);
        self.queue_events(events);
        Ok(())
    }

    fn append_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), error = %err, "disabling terminal write log");
                self.write_log_failed = true;
            }
        }
    }
}

impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ProcessTerminal {
    fn start(&mut self) -> io::Result<()> {
        self.enable_raw_mode()?;
        self.stdin_buffer.clear();
        self.pending.clear();
        self.resized.store(false, Ordering::SeqCst);

        if self.resize_sig.is_none() {
            match signal_hook::flag::register(libc::SIGWINCH, Arc::clone(&self.resized)) {
                Ok(id) => self.resize_sig = Some(id),
                Err(err) => {
                    let _ = self.restore_raw_mode();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        if let Some(id) = self.resize_sig.take() {
            signal_hook::low_level::unregister(id);
        }
        self.stdin_buffer.clear();
        self.pending.clear();

        // Flush input before leaving raw mode so buffered bytes don't leak to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.restore_raw_mode()
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        let end_time = Instant::now() + Duration::from_millis(max_ms);
        let mut buf = [0u8; 1024];
        loop {
            let now = Instant::now();
            if now >= end_time {
                break;
            }
            let remaining = end_time.saturating_duration_since(now).as_millis() as u64;
            let wait_ms = idle_ms.min(remaining).max(1) as i32;
            match poll_readable(self.stdin_fd, wait_ms) {
                Ok(true) => match read_fd(self.stdin_fd, &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                },
                // Idle for a full window (or poll failed): nothing more is coming.
                Ok(false) | Err(_) => break,
            }
        }
        self.stdin_buffer.clear();
        self.pending.clear();
    }

    fn input_ready(&mut self) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        if self.stdin_buffer.has_due(Instant::now()) {
            return Ok(true);
        }
        poll_readable(self.stdin_fd, 0)
    }

    fn read_input(&mut self) -> io::Result<Option<String>> {
        if self.pending.is_empty() {
            let due = self.stdin_buffer.flush_due(Instant::now());
            self.queue_events(due);
        }
        if self.pending.is_empty() && poll_readable(self.stdin_fd, 0)? {
            self.fill_pending()?;
        }
        Ok(self.pending.pop_front())
    }

    fn take_resize(&mut self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        write_fd(self.stdout_fd, data)?;
        self.append_write_log(data);
        Ok(())
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }
}

impl Drop for ProcessTerminal {
    fn drop(&mut self) {
        if let Some(id) = self.resize_sig.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

/// Signal registrations that flip a shared flag; unregistered on drop.
pub struct SignalHookGuard {
    ids: Vec<SigId>,
}

impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

/// Route SIGINT, SIGTERM and SIGHUP to `flag`. The handlers only store `true`; the caller
/// polls the flag and shuts down from its own loop.
pub fn install_signal_handlers(flag: Arc<AtomicBool>) -> io::Result<SignalHookGuard> {
    let mut guard = SignalHookGuard { ids: Vec::new() };
    for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
        // On error the partially built guard unregisters what was already installed.
        let id = signal_hook::flag::register(signal, Arc::clone(&flag))?;
        guard.ids.push(id);
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use std::time::{Duration, Instant};

    use super::{get_termios, install_signal_handlers, poll_readable, write_all_fd_with, ProcessTerminal};
    use crate::core::terminal::Terminal;

    use libc::{self, c_int};

    struct Pty {
        master: c_int,
        slave: c_int,
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.master);
                libc::close(self.slave);
            }
        }
    }

    fn open_pty() -> Pty {
        let mut master: c_int = 0;
        let mut slave: c_int = 0;
        let result = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, 0, "openpty failed");
        Pty { master, slave }
    }

    fn pty_terminal(pty: &Pty) -> ProcessTerminal {
        let mut terminal = ProcessTerminal::new();
        terminal.stdin_fd = pty.slave;
        terminal.stdout_fd = pty.slave;
        terminal
    }

    fn write_master(pty: &Pty, bytes: &[u8]) {
        let written =
            unsafe { libc::write(pty.master, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
        assert_eq!(written, bytes.len() as isize, "short write to pty master");
    }

    fn read_available(fd: c_int, timeout: Duration) -> Vec<u8> {
        let end = Instant::now() + timeout;
        let mut out = Vec::new();
        while Instant::now() < end {
            let remaining = end.saturating_duration_since(Instant::now());
            let timeout_ms = remaining.as_millis().min(i32::MAX as u128) as i32;
            if timeout_ms == 0 || !poll_readable(fd, timeout_ms).unwrap_or(false) {
                break;
            }
            let mut buf = [0u8; 1024];
            let read_len = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut _, buf.len()) };
            if read_len <= 0 {
                break;
            }
            out.extend_from_slice(&buf[..read_len as usize]);
        }
        out
    }

    /// Spin on the zero-timeout readiness check until input shows up or `timeout` passes.
    fn wait_ready(terminal: &mut ProcessTerminal, timeout: Duration) -> bool {
        let end = Instant::now() + timeout;
        while Instant::now() < end {
            if terminal.input_ready().expect("input_ready") {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn start_enters_raw_mode_and_stop_restores_it() {
        let pty = open_pty();
        let original = get_termios(pty.slave).expect("get termios");
        let mut terminal = pty_terminal(&pty);

        terminal.start().expect("terminal start");
        let raw = get_termios(pty.slave).expect("get termios");
        assert_eq!(raw.c_lflag & libc::ICANON, 0, "canonical mode still on");
        assert_eq!(raw.c_lflag & libc::ISIG, 0, "signal keys still on");

        terminal.stop().expect("terminal stop");
        let restored = get_termios(pty.slave).expect("get termios");
        assert_eq!(restored.c_lflag, original.c_lflag, "raw mode not restored");

        let output = read_available(pty.master, Duration::from_millis(100));
        assert!(
            output.is_empty(),
            "expected start()/stop() to write no output, got: {:?}",
            String::from_utf8_lossy(&output)
        );
    }

    #[test]
    fn input_ready_is_false_without_pending_bytes() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal.start().expect("terminal start");

        assert!(!terminal.input_ready().expect("input_ready"));
        assert_eq!(terminal.read_input().expect("read_input"), None);

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn keys_are_delivered_one_sequence_at_a_time() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal.start().expect("terminal start");

        write_master(&pty, b"hi\x1b[D\r");

        let mut seen = Vec::new();
        let end = Instant::now() + Duration::from_millis(500);
        while seen.len() < 4 && Instant::now() < end {
            if !wait_ready(&mut terminal, Duration::from_millis(50)) {
                continue;
            }
            if let Some(sequence) = terminal.read_input().expect("read_input") {
                seen.push(sequence);
            }
        }
        assert_eq!(seen, vec!["h", "i", "\x1b[D", "\r"]);

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn bracketed_paste_is_rewrapped() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal.start().expect("terminal start");

        write_master(&pty, b"\x1b[200~hello\x1b[201~");
        assert!(wait_ready(&mut terminal, Duration::from_millis(500)));
        assert_eq!(
            terminal.read_input().expect("read_input").as_deref(),
            Some("\x1b[200~hello\x1b[201~")
        );

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn drain_input_returns_within_limits() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal.start().expect("terminal start");
        write_master(&pty, b"leftover");

        let start = Instant::now();
        terminal.drain_input(200, 50);
        let elapsed = start.elapsed();
        assert!(
            elapsed <= Duration::from_millis(300),
            "drain_input exceeded max window: {elapsed:?}"
        );
        assert!(!terminal.input_ready().expect("input_ready"));

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn write_reaches_the_pty() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal.write("hello").expect("write");
        let output = read_available(pty.master, Duration::from_millis(200));
        assert_eq!(output, b"hello");
    }

    #[test]
    fn start_returns_err_on_tcgetattr_failure() {
        let mut terminal = ProcessTerminal::new();
        terminal.stdin_fd = -1;
        terminal.stdout_fd = -1;

        let err = terminal.start().expect_err("expected start to fail");
        assert_eq!(
            err.raw_os_error(),
            Some(libc::EBADF),
            "expected EBADF, got: {err:?}"
        );
    }

    #[test]
    fn signal_handlers_only_set_the_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = install_signal_handlers(Arc::clone(&flag)).expect("install handlers");

        unsafe {
            libc::raise(libc::SIGHUP);
        }
        assert!(flag.load(Ordering::SeqCst));
        drop(guard);
    }

    #[test]
    fn write_all_fd_with_retries_on_eintr_and_writes_all_bytes() {
        let data = b"hello";
        let mut out = Vec::new();
        let mut calls = 0;
        write_all_fd_with(
            1,
            data,
            |_, buf| {
                calls += 1;
                match calls {
                    1 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    2 => {
                        out.extend_from_slice(&buf[..2]);
                        Ok(2)
                    }
                    _ => {
                        out.extend_from_slice(buf);
                        Ok(buf.len())
                    }
                }
            },
            |_| unreachable!("wait_writable should not be called for EINTR"),
        )
        .expect("write_all_fd_with failed");

        assert_eq!(out, data);
    }

    #[test]
    fn write_all_fd_with_waits_for_writable_on_would_block_and_retries() {
        let data = b"xyz";
        let mut out = Vec::new();
        let mut calls = 0;
        let events = std::cell::RefCell::new(Vec::new());
        write_all_fd_with(
            1,
            data,
            |_, buf| {
                events.borrow_mut().push("write");
                calls += 1;
                if calls == 1 {
                    return Err(io::Error::from(io::ErrorKind::WouldBlock));
                }
                out.extend_from_slice(buf);
                Ok(buf.len())
            },
            |_| {
                events.borrow_mut().push("wait");
                Ok(())
            },
        )
        .expect("write_all_fd_with failed");

        assert_eq!(out, data);
        assert_eq!(events.into_inner(), vec!["write", "wait", "write"]);
    }

    #[test]
    fn write_all_fd_with_rejects_zero_length_writes() {
        let err = write_all_fd_with(1, b"abc", |_, _| Ok(0), |_| Ok(()))
            .expect_err("zero-length write must fail");
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }
}
