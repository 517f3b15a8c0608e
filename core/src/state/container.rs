//! The observable state container interface.

use std::fmt;
use std::sync::Arc;

/// Change notification callback. Takes no arguments; listeners read the
/// new snapshot through [`StateContainer::get_state`].
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// An object holding an immutable state snapshot that can be observed.
///
/// `get_state` must keep returning the same `Arc` until the state changes.
/// Awaiters compare snapshots by pointer to detect writes they could not
/// have been notified about.
pub trait StateContainer: Send + Sync {
    type State: Send + Sync + 'static;

    /// Current snapshot.
    fn get_state(&self) -> Arc<Self::State>;

    /// Registers `listener` to be called after every state change.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// De-registration handle returned by [`StateContainer::subscribe`].
///
/// The release runs exactly once: on [`Subscription::unsubscribe`], or on
/// drop if it was never called explicitly.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
