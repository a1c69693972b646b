//! REST API client module for the comment-generation service.
//!
//! This module provides the `ApiClient`, the single path every outgoing call
//! takes. It attaches the session's bearer token and reacts to 401 responses
//! by tearing the session down.

pub mod client;
pub mod comments;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, ErrorBody};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
