//! Condition polling for settle.
//!
//! [`wait_for_condition`] evaluates a predicate once immediately and then on a
//! timer whose interval doubles after a run of pending checks, until the
//! predicate reports done, fails, or the timeout elapses.

mod cadence;
mod wait;

pub use cadence::{Cadence, MIN_INTERVAL, Step};
pub use wait::{wait_for_condition, wait_for_named};

pub use settle_types::{BoxError, ConditionResult, WaitConfig, WaitError, WaitErrorKind};
