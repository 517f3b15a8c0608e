//! In-memory observable store

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use super::container::{Listener, StateContainer, Subscription};
use super::{lock, read, write};

/// Shared, cheaply clonable handle to a state snapshot plus its listeners.
///
/// Writes replace the snapshot wholesale (last write wins) and then notify
/// every listener that was registered when the write finished, in
/// registration order. Listeners run after all internal locks are released,
/// so they may read state or unsubscribe themselves.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

struct StoreInner<S> {
    /// Current snapshot
    state: RwLock<Arc<S>>,
    /// Registered listeners, in subscription order
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    /// Incremented once per write
    version: AtomicU64,
}

impl<S> Store<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let inner = StoreInner {
            state: RwLock::new(Arc::new(initial)),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            version: AtomicU64::new(0),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn get_state(&self) -> Arc<S> {
        read(&self.inner.state).clone()
    }

    /// Replaces the snapshot and notifies listeners.
    pub fn set_state(&self, next: S) {
        {
            let mut state = write(&self.inner.state);
            *state = Arc::new(next);
            self.inner.version.fetch_add(1, Ordering::AcqRel);
        }
        self.notify();
    }

    /// Clones the current snapshot, applies `f`, stores the result and
    /// notifies listeners. `f` runs under the write lock and must not touch
    /// the store.
    pub fn update_state<F>(&self, f: F)
    where
        S: Clone,
        F: FnOnce(&mut S),
    {
        {
            let mut state = write(&self.inner.state);
            let mut next = S::clone(&state);
            f(&mut next);
            *state = Arc::new(next);
            self.inner.version.fetch_add(1, Ordering::AcqRel);
        }
        self.notify();
    }

    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, listener));
        tracing::trace!(listener_id = id, "store listener added");

        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner.listeners).retain(|(other, _)| *other != id);
                tracing::trace!(listener_id = id, "store listener removed");
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Number of writes so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    fn notify(&self) {
        // Snapshot the list so listeners can unsubscribe while being called.
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::trace!(
            version = self.version(),
            listeners = listeners.len(),
            "store notifying"
        );
        for listener in listeners {
            listener();
        }
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> Default for Store<S>
where
    S: Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> StateContainer for Store<S>
where
    S: Send + Sync + 'static,
{
    type State = S;

    fn get_state(&self) -> Arc<S> {
        Store::get_state(self)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        Store::subscribe(self, listener)
    }
}
