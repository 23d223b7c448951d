//! Fixed-interval tick scheduling.
//!
//! Paces the live loop at the configured tick interval and tracks how long
//! each tick's work took.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use idle_common::Millis;

/// Fixed-interval ticker.
#[derive(Debug)]
pub struct Ticker {
    /// Time between tick starts
    interval: Duration,
    /// Start of the current tick
    tick_start: Instant,
    /// Ticks begun
    ticks: u64,
    /// Recent work durations for averaging
    work_times: VecDeque<Duration>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Ticker {
    /// Create a ticker firing every `interval_ms` (minimum 1 ms).
    #[must_use]
    pub fn new(interval_ms: Millis) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            tick_start: Instant::now(),
            ticks: 0,
            work_times: VecDeque::with_capacity(64),
            max_samples: 64,
        }
    }

    /// Tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Marks the start of a tick.
    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
        self.ticks += 1;
    }

    /// Records the finished tick's work and returns how long to sleep before
    /// the next one.
    pub fn finish(&mut self) -> Duration {
        let work = self.tick_start.elapsed();
        self.work_times.push_back(work);
        if self.work_times.len() > self.max_samples {
            self.work_times.pop_front();
        }
        self.interval.saturating_sub(work)
    }

    /// Finishes the tick and sleeps out the remainder of the interval.
    pub fn sleep_remainder(&mut self) {
        let remaining = self.finish();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }

    /// Ticks begun so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Average work time per tick in milliseconds.
    #[must_use]
    pub fn average_work_ms(&self) -> f64 {
        if self.work_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.work_times.iter().sum();
        total.as_secs_f64() * 1000.0 / self.work_times.len() as f64
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(100)
    }
}
