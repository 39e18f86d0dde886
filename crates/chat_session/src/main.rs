use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chat_session::{Nick, RunFlag, Session, SessionError};
use clap::Parser;
use tailchat_tui::logging::init_file_logging;
use tailchat_tui::{install_signal_handlers, EnvConfig, ProcessTerminal, ThreadPacer};

/// Chat with everyone who can append to the same file.
#[derive(Parser, Debug)]
#[command(name = "tailchat", version, about)]
struct Args {
    /// Shared log file, created if it does not exist
    file: PathBuf,

    /// Nickname (1-15 ASCII letters and digits); defaults to $USER, then $LOGNAME
    nick: Option<String>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version land here too, on stdout and with success.
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return code;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tailchat: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), SessionError> {
    let config = EnvConfig::from_env();
    if let Some(path) = config.debug_log.as_deref() {
        init_file_logging(Path::new(path), &config.log_filter).map_err(SessionError::Logging)?;
    }

    let nick = match args.nick.as_deref() {
        Some(raw) => Nick::parse(raw)?,
        None => Nick::from_login_env()?,
    };

    let run_flag = RunFlag::new();
    let _signals = install_signal_handlers(run_flag.signal_target())
        .map_err(|source| SessionError::terminal("installing signal handlers", source))?;

    let terminal =
        ProcessTerminal::new().with_write_log(config.write_log.as_ref().map(PathBuf::from));
    let mut session = Session::join(&args.file, nick, terminal, ThreadPacer, &config, run_flag)?;

    let ran = session.run();
    if let Err(err) = &ran {
        tracing::error!(error = %err, "session ended with an error");
    }
    session.finish(ran)
}
