//! Widgets driven by the display interleaver.

pub mod line_input;

pub use line_input::LineInput;
