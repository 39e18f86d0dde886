pub mod commands;
pub mod error;
pub mod identity;
pub mod mention;
pub mod session;

pub use commands::{parse_submission, Command, Submission};
pub use error::SessionError;
pub use identity::{Nick, NickError, MAX_NICK_LEN};
pub use mention::is_mentioned;
pub use session::{RunFlag, Session, SessionState};
