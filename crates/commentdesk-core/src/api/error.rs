use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::auth::storage::StorageError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session is missing or expired")]
    Unauthorized(ErrorBody),

    #[error("Access denied: {0}")]
    AccessDenied(ErrorBody),

    #[error("Resource not found: {0}")]
    NotFound(ErrorBody),

    #[error("Request rejected (status {status}): {body}")]
    Rejected { status: u16, body: ErrorBody },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(ErrorBody),

    #[error("Network error: {0}")]
    NetworkError(#[source] BoxError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Stored token is not a valid header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::NetworkError(Box::new(e))
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// The part of an error body the server fills in for humans
#[derive(Deserialize)]
struct MessageField {
    message: Option<String>,
}

/// Body of an error response: a truncated copy for display plus the
/// server's `message`, parsed from the full body before truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub text: String,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(body: &str) -> Self {
        let message = serde_json::from_str::<MessageField>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Self {
            text: truncate_body(body),
            message,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = ErrorBody::new(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(body),
            403 => ApiError::AccessDenied(body),
            404 => ApiError::NotFound(body),
            429 => ApiError::RateLimited,
            400..=499 => ApiError::Rejected {
                status: status.as_u16(),
                body,
            },
            500..=599 => ApiError::ServerError(body),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, body)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// The `message` field of the server's error body, if there was one
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::ServerError(body)
            | ApiError::Rejected { body, .. } => body.message.clone(),
            _ => None,
        }
    }

    /// Human-readable message: the server's own wording, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or_else(|| fallback.to_string())
    }
}
