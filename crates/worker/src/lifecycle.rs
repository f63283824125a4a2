//! Lifecycle states and the host integration seam.
//!
//! The worker moves `Installing -> Installed -> Activating -> Active` and
//! stays `Active` until a newer version's install supersedes it. The two
//! side effects that only the embedding host can perform — replacing a
//! previous instance early and seizing open clients — go through
//! [`HostHooks`] so transitions stay testable without a live host.

use async_trait::async_trait;

/// Where the worker is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Active,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        }
    }
}

/// Host-side effects the worker can request but not perform itself.
#[async_trait]
pub trait HostHooks: Send + Sync {
    /// Replace any previously active instance without waiting for its
    /// clients to close.
    async fn skip_waiting(&self);

    /// Take control of currently open clients immediately rather than on
    /// their next navigation.
    async fn claim_clients(&self);
}

/// Hooks for hosts with nothing to signal (tests, standalone runs).
pub struct NoopHooks;

#[async_trait]
impl HostHooks for NoopHooks {
    async fn skip_waiting(&self) {}

    async fn claim_clients(&self) {}
}
