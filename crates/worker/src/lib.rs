//! The stratus interception engine.
//!
//! This crate decides, per intercepted request, which retrieval strategy to
//! apply, how cache entries are populated, aged, and evicted, and what is
//! returned when both network and cache fail. The embedding host feeds it
//! requests through [`Worker::handle_request`], typed commands through
//! [`Worker::handle_message`], and deferred tasks through
//! [`Worker::handle_task`].

pub mod classify;
pub mod commands;
pub mod fallback;
pub mod lifecycle;
pub mod strategies;
pub mod sweeper;
pub mod worker;

pub use classify::ResourceClass;
pub use lifecycle::{HostHooks, LifecycleState, NoopHooks};
pub use worker::Worker;

#[cfg(test)]
pub(crate) mod testing;
