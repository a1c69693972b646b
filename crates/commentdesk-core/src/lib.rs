//! Core library for commentdesk.
//!
//! This crate holds the client-side session layer for the comment-generation
//! service:
//! - `auth`: the persisted `SessionStore` and the `CredentialGateway`
//! - `api`: the `ApiClient` request pipeline that attaches bearer tokens and
//!   tears the session down on 401 responses
//! - `router`: route table and the `RouteGuard` evaluated before navigation
//! - `models`: wire payloads for the remote API
//! - `config`: base URL and storage locations

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, HttpTransport, ReqwestTransport};
pub use auth::{CredentialGateway, CurrentUser, KeyValueStorage, Session, SessionStore};
pub use config::Config;
pub use router::{GuardDecision, Navigator, Route, RouteGuard, RouteRecord, RouteTable};
