mod cursor;
mod error;
mod record;
mod store;

pub use cursor::ReadCursor;
pub use error::{CursorError, LogError};
pub use record::{format_line, Record};
pub use store::{LogStore, ReadBatch};
