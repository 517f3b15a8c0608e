//! Stable re-exports for consumers.
//!
//! Prefer importing from `sidebar_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AwaiterConfig, LoggingConfig, SidebarConfig,
};
pub use crate::error::AwaitError;
pub use crate::logging::init_tracing;
pub use crate::state::{
    await_state_change, try_await_state_change, Listener, StateChange, StateContainer, Store,
    Subscription,
};
