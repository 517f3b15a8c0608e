//! State plumbing for the annotation sidebar: an observable in-memory store
//! and an awaiter that resolves once the store reaches a condition.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
