//! Wire payloads for the comment-generation API.
//!
//! Every response carries a `success` flag and usually a `message`; the
//! remaining fields depend on the endpoint.

pub mod auth;
pub mod comment;

pub use auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserInfoResponse, UserProfile};
pub use comment::{
    AiModel, CommentHistoryResponse, CommentRecord, DeleteCommentResponse, GenerateCommentRequest,
    GenerateCommentResponse,
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// Timestamp formats the backend emits (SQLite `CURRENT_TIMESTAMP`, ISO 8601)
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}

/// Lenient timestamp field: missing, null or unparseable values become `None`
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
