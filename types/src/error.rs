use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed error returned by a failing condition.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Terminal failure of a wait. Neither variant is retried internally.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The condition itself failed while being evaluated.
    #[error("error on condition `{condition}` (attempt {attempt}): {source}")]
    Evaluation {
        condition: String,
        attempt: u64,
        #[source]
        source: BoxError,
    },
    /// The timeout elapsed before the condition reported done.
    #[error("timeout on condition `{condition}` after {}ms ({attempts} attempts)", .elapsed.as_millis())]
    Timeout {
        condition: String,
        elapsed: Duration,
        attempts: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitErrorKind {
    Evaluation,
    Timeout,
}

impl WaitError {
    #[must_use]
    pub const fn kind(&self) -> WaitErrorKind {
        match self {
            Self::Evaluation { .. } => WaitErrorKind::Evaluation,
            Self::Timeout { .. } => WaitErrorKind::Timeout,
        }
    }

    /// Label of the condition that failed.
    #[must_use]
    pub fn condition(&self) -> &str {
        match self {
            Self::Evaluation { condition, .. } | Self::Timeout { condition, .. } => condition,
        }
    }

    /// Number of times the condition was evaluated, including the failing call.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        match self {
            Self::Evaluation { attempt, .. } => *attempt,
            Self::Timeout { attempts, .. } => *attempts,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
