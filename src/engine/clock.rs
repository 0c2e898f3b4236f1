//! Monotonic time and blocking delays for the cooperative scheduler.
//!
//! Every suspension point of the engine (calibration sampling, the double
//! click gap, indicator pulses, pressure-test streaming, the tick sleep) goes
//! through [`Clock::delay_ms`]. Nothing else in the engine progresses while a
//! delay is running.

use std::time::{Duration, Instant};

/// Millisecond clock used by the engine.
pub trait Clock {
    /// Milliseconds elapsed since the clock was created.
    fn now_ms(&self) -> u64;

    /// Block the engine thread for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u64);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
