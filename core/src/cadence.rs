//! Backoff cadence for the polling timer.
//!
//! The cadence counts pending checks at the current interval. Once the count
//! exceeds `attempts_before_slowing`, the next pending check resets the count
//! and doubles the interval instead of counting. Each cadence level therefore
//! spans `attempts_before_slowing + 2` ticks, and the rearmed timer first fires
//! one full new interval after the rearm, so one check at the old cadence is
//! skipped at every boundary.

use std::time::Duration;

use settle_types::WaitConfig;

/// Smallest interval the timer is armed with. A zero interval is clamped up to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What the polling loop should do after a pending check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep the current timer.
    Continue,
    /// Drop the current timer and arm a new one at this interval.
    Slow(Duration),
}

#[derive(Debug, Clone)]
pub struct Cadence {
    attempts: u32,
    interval: Duration,
    attempts_before_slowing: u32,
}

impl Cadence {
    #[must_use]
    pub fn new(config: &WaitConfig) -> Self {
        Self {
            attempts: 0,
            interval: config.initial_interval().max(MIN_INTERVAL),
            attempts_before_slowing: config.attempts_before_slowing(),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Pending checks counted since the last slowdown.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a timed check that was neither done, failed, nor timed out.
    pub fn record_pending(&mut self) -> Step {
        if self.attempts > self.attempts_before_slowing {
            self.attempts = 0;
            self.interval = self.interval.saturating_mul(2);
            return Step::Slow(self.interval);
        }
        self.attempts = self.attempts.saturating_add(1);
        Step::Continue
    }
}
