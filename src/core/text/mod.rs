//! Text helpers (width calculations, grapheme segmentation, control-character scrubbing).
//!
//! These helpers are pure (string in/string out) so widgets and the interleaver can share them.

pub mod utils;
pub mod width;
