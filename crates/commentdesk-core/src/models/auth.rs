use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::deserialize_timestamp;

/// Body of `POST /api/register`
#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

/// Body of `POST /api/login`
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<NaiveDateTime>,
}

/// Body of `GET /api/user/info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub user: Option<UserProfile>,
}
