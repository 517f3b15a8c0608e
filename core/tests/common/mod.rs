#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sidebar_core::state::{Listener, StateContainer, Store, Subscription};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Number {
    pub val: u32,
}

pub fn number_store(val: u32) -> Store<Number> {
    Store::new(Number { val })
}

/// `None` until the number reaches 3.
pub fn find_num(state: &Number) -> Option<u32> {
    if state.val < 3 {
        return None;
    }
    Some(state.val)
}

/// Records every value a predicate was evaluated against.
#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<u32>>>);

impl Seen {
    pub fn record(&self, state: &Number) {
        self.0.lock().unwrap().push(state.val);
    }

    pub fn values(&self) -> Vec<u32> {
        self.0.lock().unwrap().clone()
    }
}

/// A [`Store`] wrapper counting subscribe and unsubscribe calls.
#[derive(Clone)]
pub struct CountingStore {
    pub store: Store<Number>,
    subscribes: Arc<AtomicUsize>,
    unsubscribes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(val: u32) -> Self {
        Self {
            store: number_store(val),
            subscribes: Arc::new(AtomicUsize::new(0)),
            unsubscribes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, val: u32) {
        self.store.set_state(Number { val });
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

impl StateContainer for CountingStore {
    type State = Number;

    fn get_state(&self) -> Arc<Number> {
        self.store.get_state()
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let inner = self.store.subscribe(listener);
        let unsubscribes = self.unsubscribes.clone();
        Subscription::new(move || {
            unsubscribes.fetch_add(1, Ordering::SeqCst);
            inner.unsubscribe();
        })
    }
}

/// A hand-driven container: writes and notifications are separate steps, so
/// tests can interleave them with subscription the way concurrent writers
/// would.
#[derive(Clone)]
pub struct ManualContainer {
    inner: Arc<ManualInner>,
}

struct ManualInner {
    state: Mutex<Arc<Number>>,
    listeners: Mutex<Vec<(usize, Listener)>>,
    next_id: AtomicUsize,
    /// Written (without notifying) inside `subscribe`, before the listener
    /// is registered.
    write_on_subscribe: Option<u32>,
}

impl ManualContainer {
    pub fn new(val: u32) -> Self {
        Self::build(val, None)
    }

    pub fn writing_on_subscribe(val: u32, written: u32) -> Self {
        Self::build(val, Some(written))
    }

    fn build(val: u32, write_on_subscribe: Option<u32>) -> Self {
        Self {
            inner: Arc::new(ManualInner {
                state: Mutex::new(Arc::new(Number { val })),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicUsize::new(0),
                write_on_subscribe,
            }),
        }
    }

    pub fn write_silently(&self, val: u32) {
        *self.inner.state.lock().unwrap() = Arc::new(Number { val });
    }

    pub fn notify(&self) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Forgets every listener, as a container being torn down would.
    pub fn drop_listeners(&self) {
        let dropped = std::mem::take(&mut *self.inner.listeners.lock().unwrap());
        drop(dropped);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }
}

impl StateContainer for ManualContainer {
    type State = Number;

    fn get_state(&self) -> Arc<Number> {
        self.inner.state.lock().unwrap().clone()
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        if let Some(val) = self.inner.write_on_subscribe {
            self.write_silently(val);
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().unwrap().push((id, listener));

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().unwrap().retain(|(other, _)| *other != id);
            }
        })
    }
}
