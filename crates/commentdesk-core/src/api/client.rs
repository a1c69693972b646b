//! Authorizing API client.
//!
//! Every call made through `ApiClient` passes the same two stages:
//! - outbound: the current session token, if any, is attached as
//!   `Authorization: Bearer <token>`
//! - inbound: a 401 clears the session and redirects to the login route
//!   before the error is returned to the caller
//!
//! Nothing is retried and each stage runs exactly once per call.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue, InvalidHeaderValue};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use super::ApiError;
use crate::auth::SessionStore;
use crate::router::{Navigator, Route};

/// `Authorization` header value for a bearer token
pub(crate) fn bearer(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    /// Send a request through the authorization pipeline.
    ///
    /// Transport failures are returned as-is with no session side effects.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.authorize(request)?;
        let method = request.method.clone();
        let path = request.path.clone();

        let response = self.transport.send(request).await?;
        debug!(%method, path = %path, status = response.status.as_u16(), "Response received");

        self.inspect(response).await
    }

    fn authorize(&self, mut request: ApiRequest) -> Result<ApiRequest, ApiError> {
        match self.session.token() {
            Some(token) => {
                request.headers.insert(header::AUTHORIZATION, bearer(&token)?);
                debug!(path = %request.path, "Bearer credential attached");
            }
            None => debug!(path = %request.path, "No session, sending unauthenticated request"),
        }
        Ok(request)
    }

    async fn inspect(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.status == StatusCode::UNAUTHORIZED {
            self.teardown().await;
            return Err(ApiError::from_status(response.status, &response.body));
        }
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// Clear the session and redirect to login. Runs on the blocking pool and
    /// completes even if the calling future is dropped.
    async fn teardown(&self) {
        let session = self.session.clone();
        let navigator = self.navigator.clone();
        let task = tokio::task::spawn_blocking(move || {
            if let Err(e) = session.clear() {
                warn!(error = %e, "Failed to remove persisted session after 401");
            }
            info!("Unauthorized response, session cleared");
            navigator.navigate(Route::Login);
        });
        if let Err(e) = task.await {
            warn!(error = %e, "Session teardown did not finish");
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::get(path);
        for (key, value) in query {
            request = request.with_query(key, value);
        }
        self.execute(request).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.execute(ApiRequest::post(path, body)).await?.json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::delete(path)).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ReqwestTransport;
    use crate::test_support::{serve_once, session_store, FakeTransport, RecordingNavigator};
    use serde_json::{json, Value};

    fn client() -> (ApiClient, Arc<FakeTransport>, Arc<RecordingNavigator>, SessionStore) {
        let transport = Arc::new(FakeTransport::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let session = session_store();
        let client = ApiClient::new(transport.clone(), session.clone(), navigator.clone());
        (client, transport, navigator, session)
    }

    #[tokio::test]
    async fn test_active_session_attaches_bearer_header() {
        let (client, transport, _, session) = client();
        session.set("T1", 7, "alice").unwrap();
        transport.push_json(200, json!({"success": true}));

        let _: Value = client.get("/api/user/info", &[]).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization(), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn test_header_follows_current_token() {
        let (client, transport, _, session) = client();
        session.set("T1", 7, "alice").unwrap();
        transport.push_json(200, json!({}));
        transport.push_json(200, json!({}));

        let _: Value = client.get("/api/user/info", &[]).await.unwrap();
        session.set("T2", 7, "alice").unwrap();
        let _: Value = client.get("/api/user/info", &[]).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].authorization(), Some("Bearer T1"));
        assert_eq!(requests[1].authorization(), Some("Bearer T2"));
    }

    #[tokio::test]
    async fn test_inactive_session_sends_no_header() {
        let (client, transport, _, _) = client();
        transport.push_json(200, json!({"success": true}));

        let _: Value = client.post("/api/login", &json!({"username": "alice"})).await.unwrap();

        assert_eq!(transport.requests()[0].authorization(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_redirects() {
        let (client, transport, navigator, session) = client();
        session.set("T1", 7, "alice").unwrap();
        transport.push_json(401, json!({"msg": "Token has expired"}));

        let result: Result<Value, _> = client.get("/api/comment/history", &[]).await;

        assert!(result.unwrap_err().is_unauthorized());
        assert!(!session.is_active());
        assert_eq!(session.current(), Default::default());
        assert_eq!(navigator.routes(), vec![Route::Login]);
        // No retry
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_without_session_still_redirects() {
        let (client, transport, navigator, session) = client();
        transport.push_json(401, json!({"success": false, "message": "bad credentials"}));

        let err = client
            .post::<Value, _>("/api/login", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.server_message().as_deref(), Some("bad credentials"));
        assert!(!session.is_active());
        assert_eq!(navigator.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_unauthorized_with_unreadable_body_still_tears_down() {
        let base = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"msg\"",
        )
        .await;
        let navigator = Arc::new(RecordingNavigator::new());
        let session = session_store();
        session.set("T1", 7, "alice").unwrap();
        let transport = Arc::new(ReqwestTransport::new(base).unwrap());
        let client = ApiClient::new(transport, session.clone(), navigator.clone());

        let result: Result<Value, _> = client.get("/api/comment/history", &[]).await;

        assert!(result.unwrap_err().is_unauthorized());
        assert!(!session.is_active());
        assert_eq!(navigator.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_other_statuses_have_no_side_effects() {
        let (client, transport, navigator, session) = client();
        session.set("T1", 7, "alice").unwrap();
        transport.push_json(403, json!({"message": "forbidden"}));
        transport.push_json(404, json!({"message": "missing"}));
        transport.push_json(500, json!({"message": "boom"}));

        for _ in 0..3 {
            let result: Result<Value, _> = client.get("/api/user/info", &[]).await;
            assert!(result.is_err());
        }

        assert!(session.is_active());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_passes_through() {
        let (client, transport, navigator, session) = client();
        session.set("T1", 7, "alice").unwrap();
        transport.push_network_error("connection refused");

        let result: Result<Value, _> = client.get("/api/user/info", &[]).await;

        assert!(matches!(result, Err(ApiError::NetworkError(_))));
        assert!(session.is_active());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_invalid_response() {
        let (client, transport, _, _) = client();
        transport.push_raw(200, "not json");

        let result: Result<Value, _> = client.get("/api/user/info", &[]).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_get_forwards_query() {
        let (client, transport, _, _) = client();
        transport.push_json(200, json!({}));

        let _: Value = client
            .get("/api/comment/history", &[("limit", "5".to_string())])
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].query,
            vec![("limit".to_string(), "5".to_string())]
        );
    }
}
