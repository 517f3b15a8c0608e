use std::time::Duration;

use thiserror::Error;

/// Why a state-change await finished without a value.
///
/// `E` is the error type of the caller's predicate. Infallible predicates
/// use [`std::convert::Infallible`], which leaves `Timeout` and `Closed`
/// as the reachable variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwaitError<E> {
    #[error("predicate failed: {0}")]
    Predicate(E),
    #[error("state did not change within {0:?}")]
    Timeout(Duration),
    /// The container dropped the awaiter's listener before any evaluation
    /// settled the wait.
    #[error("state container released the listener before the condition was met")]
    Closed,
}

impl<E> AwaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns the predicate's own error, if that is what ended the wait.
    pub fn into_predicate_error(self) -> Option<E> {
        match self {
            Self::Predicate(e) => Some(e),
            Self::Timeout(_) | Self::Closed => None,
        }
    }
}
