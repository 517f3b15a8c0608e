//! # State
//!
//! Observable state containers and the awaiter that turns "predicate over
//! state, over time" into a single future.
//!
//! - [`StateContainer`]: snapshot read plus change subscription.
//! - [`Store`]: the in-memory container used by the sidebar.
//! - [`await_state_change`]: resolves once a predicate over the container's
//!   state yields a value.

pub mod await_change;
pub mod container;
pub mod store;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use await_change::{await_state_change, try_await_state_change, StateChange};
pub use container::{Listener, StateContainer, Subscription};
pub use store::Store;

// A panicking predicate or listener poisons the lock it ran under. The data
// behind these locks stays consistent across such a panic, so keep going.

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
