use serde::Serialize;

/// Named pages of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Route {
    Login,
    Register,
    Home,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Login, Route::Register, Route::Home];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Home => "Home",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Home)
    }

    /// Login and register pages, which a logged-in user is kept out of
    pub fn is_auth_page(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// A navigation target as seen by the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub route: Option<Route>,
    pub requires_auth: bool,
}

impl From<Route> for RouteRecord {
    fn from(route: Route) -> Self {
        Self {
            path: route.path().to_string(),
            route: Some(route),
            requires_auth: route.requires_auth(),
        }
    }
}

/// Lookup from paths to route records
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: Route::ALL.into_iter().map(RouteRecord::from).collect(),
        }
    }
}

impl RouteTable {
    /// Resolve a path. Unknown paths get an unnamed record with no auth requirement.
    pub fn resolve(&self, path: &str) -> RouteRecord {
        let normalized = normalize_path(path);
        self.routes
            .iter()
            .find(|r| r.path == normalized)
            .cloned()
            .unwrap_or(RouteRecord {
                path: normalized,
                route: None,
                requires_auth: false,
            })
    }
}

/// Strip query/fragment and trailing slashes, and ensure a leading slash
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}
