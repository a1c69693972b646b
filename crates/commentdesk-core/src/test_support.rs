//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::api::{ApiError, ApiRequest, ApiResponse, HttpTransport};
use crate::auth::storage::MemoryStorage;
use crate::auth::SessionStore;
use crate::router::{Navigator, Route};

pub fn session_store() -> SessionStore {
    SessionStore::init(Arc::new(MemoryStorage::new())).unwrap()
}

/// Serve one canned HTTP response on a local port and return its base URL
pub async fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{}/", addr)
}

struct Scripted {
    result: Result<ApiResponse, ApiError>,
    gate: Option<Arc<Notify>>,
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct FakeTransport {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, result: Result<ApiResponse, ApiError>, gate: Option<Arc<Notify>>) {
        self.queue.lock().unwrap().push_back(Scripted { result, gate });
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push(Ok(response(status, body.to_string())), None);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(response(status, body.to_string())), None);
    }

    /// Queue a response that is only delivered once `gate` is notified
    pub fn push_json_gated(&self, status: u16, body: Value, gate: Arc<Notify>) {
        self.push(Ok(response(status, body.to_string())), Some(gate));
    }

    pub fn push_network_error(&self, message: &str) {
        let err = std::io::Error::other(message.to_string());
        self.push(Err(ApiError::NetworkError(Box::new(err))), None);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn response(status: u16, body: String) -> ApiResponse {
    ApiResponse {
        status: StatusCode::from_u16(status).unwrap(),
        body,
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let scripted = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .expect("FakeTransport: no response queued");
        if let Some(gate) = scripted.gate {
            gate.notified().await;
        }
        scripted.result
    }
}

/// Remembers every redirect in order
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
