//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: the token and user identity, persisted through a
//!   `KeyValueStorage` backend under the keys `auth_token`, `username` and
//!   `user_id`
//! - `CredentialGateway`: register/login/logout exchanges that create and
//!   destroy the session
//!
//! Only the session store writes the persisted keys. Everything else reads
//! the session or asks the store to clear it.

pub mod gateway;
pub mod session;
pub mod storage;

pub use gateway::CredentialGateway;
pub use session::{CurrentUser, Session, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage, StorageError};
