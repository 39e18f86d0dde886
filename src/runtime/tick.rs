//! Input multiplexer: one non-blocking pass over every input source per tick.

use std::thread;
use std::time::Duration;

/// Event sources polled by [`tick`]. Readiness checks must not block.
pub trait TickSources {
    type Error;

    /// Runs at the top of every tick (resize handling and similar housekeeping).
    fn before_tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn input_ready(&mut self) -> Result<bool, Self::Error>;

    fn feed_ready(&mut self) -> Result<bool, Self::Error>;

    /// Handle exactly one unit of keyboard input.
    fn on_input(&mut self) -> Result<(), Self::Error>;

    /// Drain and display everything new on the feed.
    fn on_feed(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Busy,
}

/// Check both sources once and dispatch whichever are ready. Never blocks.
pub fn tick<S: TickSources>(sources: &mut S) -> Result<TickOutcome, S::Error> {
    sources.before_tick()?;

    let mut outcome = TickOutcome::Idle;
    if sources.input_ready()? {
        sources.on_input()?;
        outcome = TickOutcome::Busy;
    }
    if sources.feed_ready()? {
        sources.on_feed()?;
        outcome = TickOutcome::Busy;
    }
    Ok(outcome)
}

/// The idle pause between ticks.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        thread::sleep(interval);
    }
}

/// Drives [`tick`] in a loop, pausing only after a tick that found nothing to do.
pub struct Ticker<P: Pacer> {
    interval: Duration,
    pacer: P,
}

impl<P: Pacer> Ticker<P> {
    pub fn new(interval: Duration, pacer: P) -> Self {
        Self { interval, pacer }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Tick until `running` returns false or a source fails.
    pub fn run_until<S, F>(&mut self, sources: &mut S, mut running: F) -> Result<(), S::Error>
    where
        S: TickSources,
        F: FnMut(&S) -> bool,
    {
        while running(sources) {
            if tick(sources)? == TickOutcome::Idle {
                self.pacer.pause(self.interval);
            }
        }
        Ok(())
    }
}
