//! HTTP transport seam.
//!
//! `ApiClient` builds `ApiRequest`s and hands them to an `HttpTransport`. The
//! production transport is reqwest; tests substitute a scripted one.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::ApiError;
use crate::config::REQUEST_TIMEOUT;

/// A request relative to the API base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the `Authorization` header, if set
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange. Only transport failures are errors; any HTTP
    /// status, including 4xx/5xx, comes back as a response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            // The status alone decides how an error response is handled
            Err(e) if !status.is_success() => {
                warn!(status = status.as_u16(), error = %e, "Failed to read error response body");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ApiResponse { status, body })
    }
}
