use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::SessionStore;
use crate::api::client::bearer;
use crate::api::{ApiClient, ApiError};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::router::{Navigator, Route};

const REGISTER_PATH: &str = "/api/register";
const LOGIN_PATH: &str = "/api/login";

const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Login failed";

/// Register/login/logout exchanges.
///
/// Login is the only operation that creates a session; logout is local and
/// never touches the network. Concurrent calls are not deduplicated: the last
/// login response to arrive decides the stored session.
pub struct CredentialGateway {
    api: ApiClient,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    in_flight: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

/// Keeps the loading flag raised until dropped
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CredentialGateway {
    pub fn new(api: ApiClient, session: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            session,
            navigator,
            in_flight: AtomicUsize::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Create an account. The session is left untouched.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<RegisterResponse, ApiError> {
        let _loading = self.begin();
        let body = RegisterRequest {
            username,
            password,
            email: email.unwrap_or_default(),
        };
        let result: Result<RegisterResponse, ApiError> = self.api.post(REGISTER_PATH, &body).await;
        if result.is_ok() {
            info!(username, "Registration accepted");
        }
        self.finish(result, REGISTER_FAILED)
    }

    /// Authenticate and, on success, store the returned session before
    /// handing the payload back.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let _loading = self.begin();
        let result = self.exchange_login(username, password).await;
        self.finish(result, LOGIN_FAILED)
    }

    async fn exchange_login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let data: LoginResponse = self
            .api
            .post(LOGIN_PATH, &LoginRequest { username, password })
            .await?;

        let token = data.token.as_deref().filter(|t| !t.is_empty());
        if let (true, Some(token)) = (data.success, token) {
            let user = data.user.as_ref().ok_or_else(|| {
                ApiError::InvalidResponse("login response has a token but no user".to_string())
            })?;
            if bearer(token).is_err() {
                return Err(ApiError::InvalidResponse(
                    "login response token is not a valid header value".to_string(),
                ));
            }
            self.session.set_async(token, user.id, &user.username).await?;
            info!(user_id = user.id, username = %user.username, "Login successful");
        }

        Ok(data)
    }

    /// Drop the session and send the client to the login page.
    pub async fn logout(&self) {
        if let Err(e) = self.session.clear_async().await {
            warn!(error = %e, "Failed to remove persisted session on logout");
        }
        info!("Logged out");
        self.navigator.navigate(Route::Login);
    }

    /// True while a login or register exchange is in progress
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Human-readable message from the most recent failed call
    pub fn last_error(&self) -> Option<String> {
        self.last_error_slot().clone()
    }

    fn begin(&self) -> LoadingGuard<'_> {
        *self.last_error_slot() = None;
        LoadingGuard::enter(&self.in_flight)
    }

    fn finish<T>(&self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ApiError> {
        if let Err(ref e) = result {
            let message = e.user_message(fallback);
            warn!(error = %e, message = %message, "Credential exchange failed");
            *self.last_error_slot() = Some(message);
        }
        result
    }

    fn last_error_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
