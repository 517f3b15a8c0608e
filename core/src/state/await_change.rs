//! Waiting for a state container to reach a condition.
//!
//! [`await_state_change`] evaluates a predicate against the container's
//! current snapshot. If the predicate already yields a value the returned
//! future is ready and nothing is subscribed. Otherwise the awaiter
//! subscribes, re-evaluates whenever a notification finds a new snapshot,
//! and releases the subscription as soon as one evaluation settles the wait.
//!
//! There is no built-in timeout: a predicate that never yields keeps the
//! future pending. Callers that need a bound use
//! [`StateChange::with_timeout`] or [`StateChange::bounded`].
//!
//! Predicate errors (from [`try_await_state_change`]) are always delivered
//! through the future, including an error from the initial evaluation, and
//! only after the subscription has been released.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

use super::container::{Listener, StateContainer, Subscription};
use super::lock;
use crate::config::AwaiterConfig;
use crate::error::AwaitError;

type Outcome<T, E> = Result<T, AwaitError<E>>;

/// Shared between the future (released on drop) and the waiter (released
/// on settle). Whoever takes it first unsubscribes.
type SubscriptionSlot = Arc<Mutex<Option<Subscription>>>;

/// Resolves with the first value `predicate` yields for the container's
/// state. See the [module docs](self) for the exact contract.
pub fn await_state_change<C, F, T>(container: &C, mut predicate: F) -> StateChange<T>
where
    C: StateContainer + Clone + 'static,
    F: FnMut(&C::State) -> Option<T> + Send + 'static,
    T: Send + 'static,
{
    try_await_state_change(container, move |state: &C::State| {
        Ok::<_, Infallible>(predicate(state))
    })
}

/// Like [`await_state_change`], for predicates that can fail. The first
/// `Err` ends the wait with [`AwaitError::Predicate`].
pub fn try_await_state_change<C, F, T, E>(container: &C, mut predicate: F) -> StateChange<T, E>
where
    C: StateContainer + Clone + 'static,
    F: FnMut(&C::State) -> Result<Option<T>, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let initial = container.get_state();
    tracing::trace!("evaluating predicate against initial state");
    match predicate(&initial) {
        Ok(Some(value)) => {
            tracing::debug!("state already satisfies predicate");
            return StateChange::settled(Ok(value));
        }
        Err(e) => {
            tracing::warn!("predicate failed on initial state");
            return StateChange::settled(Err(AwaitError::Predicate(e)));
        }
        Ok(None) => {}
    }

    let (tx, rx) = oneshot::channel();
    let slot: SubscriptionSlot = Arc::new(Mutex::new(None));
    let waiter = Arc::new(Mutex::new(Waiter {
        container: container.clone(),
        predicate,
        last_seen: initial,
        subscription: slot.clone(),
        tx: Some(tx),
    }));

    // The listener owns the waiter. Once the container drops the listener
    // without a result, the sender goes with it and the future sees
    // `AwaitError::Closed`.
    let listener: Listener = {
        let waiter = waiter.clone();
        Arc::new(move || lock(&*waiter).check())
    };

    let subscription = container.subscribe(listener);
    tracing::debug!("subscribed, waiting for state change");

    {
        let mut waiter = lock(&*waiter);
        if waiter.is_settled() {
            // A notification between subscribe() and here settled the wait.
            subscription.unsubscribe();
        } else {
            *lock(&*slot) = Some(subscription);
            // Covers a write that landed after the initial evaluation but
            // before the listener was registered.
            waiter.check();
        }
    }

    StateChange {
        state: ChangeState::Waiting {
            rx,
            subscription: slot,
        },
    }
}

/// Future returned by [`await_state_change`] and [`try_await_state_change`].
///
/// Dropping it before it resolves releases the container subscription.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct StateChange<T, E = Infallible> {
    state: ChangeState<T, E>,
}

enum ChangeState<T, E> {
    Settled(Outcome<T, E>),
    Waiting {
        rx: oneshot::Receiver<Outcome<T, E>>,
        subscription: SubscriptionSlot,
    },
    Done,
}

impl<T, E> StateChange<T, E> {
    fn settled(result: Outcome<T, E>) -> Self {
        Self {
            state: ChangeState::Settled(result),
        }
    }

    /// Awaits the change, giving up with [`AwaitError::Timeout`] after
    /// `limit`. The subscription is released either way.
    pub async fn with_timeout(self, limit: Duration) -> Outcome<T, E> {
        match tokio::time::timeout(limit, self).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(?limit, "gave up waiting for state change");
                Err(AwaitError::Timeout(limit))
            }
        }
    }

    /// Awaits the change under the bound configured in `config`, or without
    /// a bound if none is configured.
    pub async fn bounded(self, config: &AwaiterConfig) -> Outcome<T, E> {
        match config.timeout() {
            Some(limit) => self.with_timeout(limit).await,
            None => self.await,
        }
    }
}

impl<T, E> Future for StateChange<T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match std::mem::replace(&mut this.state, ChangeState::Done) {
            ChangeState::Settled(result) => Poll::Ready(result),
            ChangeState::Waiting {
                mut rx,
                subscription,
            } => match Pin::new(&mut rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_closed)) => {
                    tracing::warn!("state container dropped the listener before it settled");
                    release(&subscription);
                    Poll::Ready(Err(AwaitError::Closed))
                }
                Poll::Pending => {
                    this.state = ChangeState::Waiting { rx, subscription };
                    Poll::Pending
                }
            },
            ChangeState::Done => panic!("StateChange polled after completion"),
        }
    }
}

impl<T, E> Drop for StateChange<T, E> {
    fn drop(&mut self) {
        if let ChangeState::Waiting { subscription, .. } = &self.state {
            release(subscription);
        }
    }
}

// Unpin regardless of T and E: nothing here is structurally pinned.
impl<T, E> Unpin for StateChange<T, E> {}

fn release(slot: &SubscriptionSlot) {
    let subscription = lock(&**slot).take();
    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
}

struct Waiter<C: StateContainer, F, T, E> {
    container: C,
    predicate: F,
    /// Snapshot the predicate was last evaluated against
    last_seen: Arc<C::State>,
    subscription: SubscriptionSlot,
    /// Taken when the wait settles
    tx: Option<oneshot::Sender<Outcome<T, E>>>,
}

impl<C, F, T, E> Waiter<C, F, T, E>
where
    C: StateContainer,
    F: FnMut(&C::State) -> Result<Option<T>, E>,
{
    fn is_settled(&self) -> bool {
        self.tx.is_none()
    }

    /// Evaluates the predicate if the container holds a snapshot it has not
    /// seen yet. Runs for every notification and once right after
    /// subscribing, so each snapshot is evaluated at most once.
    fn check(&mut self) {
        if self.is_settled() {
            return;
        }
        let current = self.container.get_state();
        if Arc::ptr_eq(&current, &self.last_seen) {
            return;
        }

        tracing::trace!("evaluating predicate after state change");
        let result = match (self.predicate)(&current) {
            Ok(None) => {
                self.last_seen = current;
                return;
            }
            Ok(Some(value)) => {
                tracing::debug!("state change satisfied predicate");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("predicate failed after state change");
                Err(AwaitError::Predicate(e))
            }
        };
        self.last_seen = current;

        release(&self.subscription);
        if let Some(tx) = self.tx.take() {
            // The receiver is gone only if the caller dropped the future.
            let _ = tx.send(result);
        }
    }
}
