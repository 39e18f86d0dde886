//! Runtime orchestration: the tick loop and the display interleaver.

pub mod interleave;
pub mod tick;

pub use interleave::{Display, LineStyle};
pub use tick::{tick, Pacer, ThreadPacer, TickOutcome, TickSources, Ticker};
