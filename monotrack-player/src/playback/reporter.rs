//! Position reporter handle
//!
//! Exists only while the controller is playing. Dropping it cancels the
//! ticker synchronously: there is no self-rescheduling callback that could
//! fire after playback has stopped.

use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Display-rate ticker owned by the controller
#[derive(Debug)]
pub struct Reporter {
    interval: Interval,
    ticks: u64,
}

impl Reporter {
    /// Start ticking at `rate_hz`. The first tick is immediate.
    pub fn start(rate_hz: u32) -> Self {
        let mut interval = time::interval(tick_period(rate_hz));
        // Skip ticks missed while the task was stalled
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, ticks: 0 }
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) {
        self.interval.tick().await;
        self.ticks += 1;
    }

    /// Ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Wait for the next tick of an optional reporter; pends forever when there
/// is none, so it can sit in a `select!` next to other wakeups.
pub async fn next_tick(reporter: &mut Option<Reporter>) {
    match reporter {
        Some(reporter) => reporter.tick().await,
        None => std::future::pending().await,
    }
}

/// Tick period for a rate, clamped to 1-1000 Hz
pub fn tick_period(rate_hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(rate_hz.clamp(1, 1000)))
}
