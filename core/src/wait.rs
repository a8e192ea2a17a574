//! The polling loop.
//!
//! # Timeline
//!
//! ```text
//! t=0          evaluate once, no timer yet      -> Done / Err settle immediately
//! t=i, 2i, ..  evaluate, then check timeout     -> Done wins over a late timeout
//! level end    drop timer, arm at 2i            -> next check at rearm + 2i
//! ```
//!
//! The timer is an [`Interval`] owned by the returned future. It is dropped
//! before a replacement is armed and goes away with the future on every exit
//! path, so the condition is never evaluated after the wait settles.

use std::any::type_name;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use settle_types::{BoxError, ConditionResult, WaitConfig, WaitError};

use crate::cadence::{Cadence, Step};

// Matches tokio's own "never" deadline when start + period overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Poll `condition` until it reports done, fails, or `config.timeout()` elapses.
///
/// The condition is evaluated once before any timer exists, so an already-met
/// condition resolves regardless of the timeout (including a zero timeout).
/// Errors name the condition by its Rust type; use [`wait_for_named`] for a
/// readable label.
///
/// The condition runs synchronously on the polling task and must not block
/// for long.
pub async fn wait_for_condition<F, T, E>(condition: F, config: &WaitConfig) -> Result<T, WaitError>
where
    F: FnMut() -> Result<ConditionResult<T>, E>,
    E: Into<BoxError>,
{
    wait_for_named(type_name::<F>(), condition, config).await
}

/// Same as [`wait_for_condition`], with `label` used in errors and log fields.
pub async fn wait_for_named<F, T, E>(
    label: &str,
    mut condition: F,
    config: &WaitConfig,
) -> Result<T, WaitError>
where
    F: FnMut() -> Result<ConditionResult<T>, E>,
    E: Into<BoxError>,
{
    let started = Instant::now();
    let mut evaluations: u64 = 1;

    match condition() {
        Ok(ConditionResult::Done(value)) => {
            tracing::debug!(condition = %label, "Condition met on first check");
            return Ok(value);
        }
        Ok(ConditionResult::Pending) => {}
        Err(e) => return Err(evaluation_failed(label, evaluations, e.into())),
    }

    let mut cadence = Cadence::new(config);
    let mut ticker = arm(cadence.interval());

    loop {
        ticker.tick().await;
        evaluations += 1;

        match condition() {
            Ok(ConditionResult::Done(value)) => {
                tracing::debug!(
                    condition = %label,
                    attempts = evaluations,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Condition met"
                );
                return Ok(value);
            }
            Ok(ConditionResult::Pending) => {}
            Err(e) => return Err(evaluation_failed(label, evaluations, e.into())),
        }

        let elapsed = started.elapsed();
        if elapsed > config.timeout() {
            tracing::warn!(
                condition = %label,
                attempts = evaluations,
                elapsed_ms = elapsed.as_millis(),
                timeout_ms = config.timeout().as_millis(),
                "Condition timed out"
            );
            return Err(WaitError::Timeout {
                condition: label.to_string(),
                elapsed,
                attempts: evaluations,
            });
        }

        if let Step::Slow(next) = cadence.record_pending() {
            tracing::debug!(
                condition = %label,
                interval_ms = next.as_millis(),
                elapsed_ms = elapsed.as_millis(),
                "Slowing condition polling"
            );
            drop(ticker);
            ticker = arm(next);
        }
    }
}

/// First tick fires one full `period` from now, like a freshly started repeating timer.
fn arm(period: Duration) -> Interval {
    let now = Instant::now();
    let start = now
        .checked_add(period)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn evaluation_failed(label: &str, attempt: u64, source: BoxError) -> WaitError {
    tracing::warn!(
        condition = %label,
        attempt,
        error = %source,
        "Condition evaluation failed"
    );
    WaitError::Evaluation {
        condition: label.to_string(),
        attempt,
        source,
    }
}
