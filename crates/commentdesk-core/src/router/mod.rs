//! Client-side routes and navigation gating.
//!
//! This module provides:
//! - `Route` / `RouteTable`: the fixed page set and its auth requirements
//! - `Navigator`: the port through which forced redirects are issued
//! - `RouteGuard`: the check run before every navigation
//!
//! The guard reads the shared `SessionStore` on every call and keeps no state
//! of its own.

pub mod guard;
pub mod routes;

pub use guard::{GuardDecision, RouteGuard};
pub use routes::{Route, RouteRecord, RouteTable};

/// Capability to move the client to another route.
///
/// Injected into the request pipeline and the credential gateway so that
/// session teardown can force a redirect without depending on a concrete
/// router.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
