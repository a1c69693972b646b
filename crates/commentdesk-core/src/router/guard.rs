use tracing::debug;

use super::routes::{Route, RouteRecord};
use crate::auth::SessionStore;

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Navigation proceeds to the requested target
    Allow,
    /// Navigation is cancelled and the client goes here instead
    Redirect(Route),
}

/// Gate evaluated before every navigation.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
}

impl RouteGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Decide whether navigation to `target` may proceed.
    pub fn check(&self, target: &RouteRecord) -> GuardDecision {
        let decision = decide(target, self.session.is_active());
        debug!(path = %target.path, ?decision, "Route guard evaluated");
        decision
    }
}

fn decide(target: &RouteRecord, logged_in: bool) -> GuardDecision {
    if target.requires_auth && !logged_in {
        GuardDecision::Redirect(Route::Login)
    } else if logged_in && target.route.is_some_and(|r| r.is_auth_page()) {
        GuardDecision::Redirect(Route::Home)
    } else {
        GuardDecision::Allow
    }
}
