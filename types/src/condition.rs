//! Result of a single condition evaluation.

/// Outcome of evaluating a condition once.
///
/// `Done` carries the value the wait resolves with. `Pending` covers both
/// "nothing to report yet" and an explicit not-done answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionResult<T> {
    #[default]
    Pending,
    Done(T),
}

impl<T> ConditionResult<T> {
    /// Build a result from a `{ done, value }` pair.
    ///
    /// The value is discarded when `done` is false.
    pub fn from_parts(done: bool, value: T) -> Self {
        if done { Self::Done(value) } else { Self::Pending }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Pending => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ConditionResult<U> {
        match self {
            Self::Done(value) => ConditionResult::Done(f(value)),
            Self::Pending => ConditionResult::Pending,
        }
    }
}

impl<T> From<Option<T>> for ConditionResult<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Pending, Self::Done)
    }
}
