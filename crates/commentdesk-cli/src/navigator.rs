use std::sync::{Mutex, PoisonError};

use commentdesk_core::{Navigator, Route};
use tracing::info;

/// Tracks which page the terminal client is "on".
///
/// Redirects forced by the core (logout, 401 teardown) are queued so the
/// command loop can report them after the command finishes.
pub struct TerminalNavigator {
    state: Mutex<NavState>,
}

struct NavState {
    current: Route,
    redirects: Vec<Route>,
}

impl TerminalNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            state: Mutex::new(NavState {
                current: start,
                redirects: Vec::new(),
            }),
        }
    }

    pub fn current(&self) -> Route {
        self.lock().current
    }

    /// Move to a page the guard allowed. Not recorded as a redirect.
    pub fn enter(&self, route: Route) {
        self.lock().current = route;
    }

    /// Forced redirects since the last call, oldest first
    pub fn take_redirects(&self) -> Vec<Route> {
        std::mem::take(&mut self.lock().redirects)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        info!(to = %route, "Redirect");
        let mut state = self.lock();
        state.current = route;
        state.redirects.push(route);
    }
}
