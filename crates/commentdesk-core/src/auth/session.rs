use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::storage::{KeyValueStorage, StorageError};

/// Persisted key for the bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Persisted key for the username
pub const USERNAME_KEY: &str = "username";

/// Persisted key for the numeric user id
pub const USER_ID_KEY: &str = "user_id";

const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USERNAME_KEY, USER_ID_KEY];

/// An authenticated session. All three fields exist together or not at all.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .finish()
    }
}

/// Identity of the logged-in user, or both fields empty when logged out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CurrentUser {
    pub username: Option<String>,
    pub user_id: Option<i64>,
}

/// Process-wide session store.
///
/// Cloning is cheap and every clone observes the same session. `set` and
/// `clear` hold the write lock across the storage writes, so readers see either
/// the old record or the new one.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn KeyValueStorage>,
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Load the persisted session. Partial or corrupt records are wiped.
    pub fn init(storage: Arc<dyn KeyValueStorage>) -> Result<Self, StorageError> {
        let raw_token = storage.get(TOKEN_KEY)?;
        let stale_token = raw_token.is_some();
        let token = raw_token.filter(|t| !t.is_empty());
        let username = storage.get(USERNAME_KEY)?;
        let user_id = storage.get(USER_ID_KEY)?;

        let session = match (token, user_id, username) {
            (None, None, None) => {
                if stale_token {
                    warn!("Discarding empty persisted token");
                    storage.remove_many(&SESSION_KEYS)?;
                }
                None
            }
            (Some(token), Some(user_id), Some(username)) => match user_id.parse::<i64>() {
                Ok(user_id) => Some(Session {
                    token,
                    user_id,
                    username,
                }),
                Err(_) => {
                    warn!(user_id = %user_id, "Discarding persisted session with invalid user id");
                    storage.remove_many(&SESSION_KEYS)?;
                    None
                }
            },
            _ => {
                warn!("Discarding partial persisted session");
                storage.remove_many(&SESSION_KEYS)?;
                None
            }
        };

        debug!(active = session.is_some(), "Session store initialised");

        Ok(Self {
            inner: Arc::new(Inner {
                storage,
                session: RwLock::new(session),
            }),
        })
    }

    /// Replace the session with a new one, persisting all three keys.
    pub fn set(&self, token: &str, user_id: i64, username: &str) -> Result<(), StorageError> {
        let mut guard = self.write();
        let user_id_value = user_id.to_string();
        let result = self.inner.storage.set_many(&[
            (TOKEN_KEY, token),
            (USERNAME_KEY, username),
            (USER_ID_KEY, &user_id_value),
        ]);

        match result {
            Ok(()) => {
                *guard = Some(Session {
                    token: token.to_string(),
                    user_id,
                    username: username.to_string(),
                });
                info!(user_id, username, "Session stored");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.inner.storage.remove_many(&SESSION_KEYS) {
                    warn!(error = %cleanup, "Failed to roll back partial session write");
                }
                *guard = None;
                Err(e)
            }
        }
    }

    /// Remove the session. Calling this on an empty store is a no-op.
    ///
    /// The in-memory session is dropped even when the storage removal fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.write();
        let was_active = guard.take().is_some();
        self.inner.storage.remove_many(&SESSION_KEYS)?;
        if was_active {
            info!("Session cleared");
        }
        Ok(())
    }

    /// `set` on the blocking thread pool, for callers on the async runtime.
    /// Keychain backends may block on IPC.
    pub async fn set_async(&self, token: &str, user_id: i64, username: &str) -> Result<(), StorageError> {
        let store = self.clone();
        let (token, username) = (token.to_string(), username.to_string());
        run_blocking(move || store.set(&token, user_id, &username)).await
    }

    /// `clear` on the blocking thread pool
    pub async fn clear_async(&self) -> Result<(), StorageError> {
        let store = self.clone();
        run_blocking(move || store.clear()).await
    }

    pub fn is_active(&self) -> bool {
        self.read().is_some()
    }

    pub fn current(&self) -> CurrentUser {
        match self.read().as_ref() {
            Some(session) => CurrentUser {
                username: Some(session.username.clone()),
                user_id: Some(session.user_id),
            },
            None => CurrentUser::default(),
        }
    }

    /// The bearer token, if a session is active
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_blocking<F>(f: F) -> Result<(), StorageError>
where
    F: FnOnce() -> Result<(), StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.read())
            .finish()
    }
}
