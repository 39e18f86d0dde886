use crate::error::CursorError;

/// Byte offset into the shared log separating lines already shown from lines not yet shown.
///
/// Only moves forward; it always lands just past a newline (or on the offset it started at).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCursor {
    offset: u64,
}

impl ReadCursor {
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn advance(&mut self, new_offset: u64) -> Result<(), CursorError> {
        if new_offset < self.offset {
            return Err(CursorError::Backward {
                current: self.offset,
                requested: new_offset,
            });
        }
        self.offset = new_offset;
        Ok(())
    }
}
