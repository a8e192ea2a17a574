//! Resolved polling configuration.
//!
//! Raw TOML deserialization structs (with `Option` fields) stay private in
//! `settle-config`. The config loader resolves them into this type at the
//! parse boundary.

use std::time::Duration;

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_ATTEMPTS_BEFORE_SLOWING: u32 = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// How often to poll a condition and for how long.
///
/// ```
/// use std::time::Duration;
/// use settle_types::WaitConfig;
///
/// let config = WaitConfig::default()
///     .with_initial_interval(Duration::from_millis(10))
///     .with_timeout(Duration::from_secs(1));
/// assert_eq!(config.attempts_before_slowing(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    initial_interval: Duration,
    attempts_before_slowing: u32,
    timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            attempts_before_slowing: DEFAULT_ATTEMPTS_BEFORE_SLOWING,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitConfig {
    #[must_use]
    pub const fn new(
        initial_interval: Duration,
        attempts_before_slowing: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            initial_interval,
            attempts_before_slowing,
            timeout,
        }
    }

    #[must_use]
    pub const fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_attempts_before_slowing(mut self, attempts: u32) -> Self {
        self.attempts_before_slowing = attempts;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Interval between the first timed checks.
    #[must_use]
    pub const fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    /// Pending checks tolerated at one cadence before the interval doubles.
    #[must_use]
    pub const fn attempts_before_slowing(&self) -> u32 {
        self.attempts_before_slowing
    }

    /// Total budget, measured from the first evaluation.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}
