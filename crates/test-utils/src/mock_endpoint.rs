//! Scripted stand-in for the downstream ingestion API.
//!
//! Binds an axum server to an ephemeral localhost port. Each POST consumes
//! the next scripted status code; once the script runs out the fallback
//! status is returned. Every request is recorded for later assertions.
//!
//! The mock can also close its first few connections without answering,
//! which a client sees as a transport error rather than an HTTP status.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path the mock serves, matching the ingestion API route.
pub const INGEST_PATH: &str = "/weather/logs";

/// A request received by the mock endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

struct MockState {
    script: Mutex<VecDeque<u16>>,
    fallback: u16,
    requests: Mutex<Vec<RecordedRequest>>,
    dropped: AtomicUsize,
}

/// Running mock ingestion server. The server stops when this is dropped.
pub struct MockEndpoint {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockEndpoint {
    /// Start a server answering with `script` in order, then `200`.
    pub async fn start(script: impl IntoIterator<Item = u16>) -> Self {
        Self::start_with_fallback(script, 200).await
    }

    /// Start a server answering every request with `status`.
    pub async fn always(status: u16) -> Self {
        Self::start_with_fallback(std::iter::empty(), status).await
    }

    /// Start a server answering with `script` in order, then `fallback`.
    pub async fn start_with_fallback(script: impl IntoIterator<Item = u16>, fallback: u16) -> Self {
        Self::launch(script, fallback, 0).await
    }

    /// Start a server that closes its first `connections` connections
    /// unanswered, then answers with `script` in order, then `200`.
    pub async fn dropping_first(connections: usize, script: impl IntoIterator<Item = u16>) -> Self {
        Self::launch(script, 200, connections).await
    }

    async fn launch(
        script: impl IntoIterator<Item = u16>,
        fallback: u16,
        drop_connections: usize,
    ) -> Self {
        let state = Arc::new(MockState {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            requests: Mutex::new(Vec::new()),
            dropped: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(INGEST_PATH, post(ingest))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock endpoint");
        let addr = listener.local_addr().expect("mock endpoint address");

        let dropper = state.clone();
        let handle = tokio::spawn(async move {
            for _ in 0..drop_connections {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        drop(stream);
                        dropper.dropped.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(_) => return,
                }
            }
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Full URL of the ingestion route.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, INGEST_PATH)
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Connections closed without a response.
    pub fn dropped_connections(&self) -> usize {
        self.state.dropped.load(Ordering::SeqCst)
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn ingest(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { content_type, body });

    let code = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(state.fallback);

    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A URL on localhost where nothing is listening.
///
/// Binds an ephemeral port and releases it immediately, so connecting to it
/// fails with "connection refused".
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind scratch listener");
    let addr = listener.local_addr().expect("scratch listener address");
    drop(listener);
    format!("http://{}{}", addr, INGEST_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let mock = MockEndpoint::start_with_fallback([500, 201], 503).await;
        let client = reqwest::Client::new();

        let mut codes = Vec::new();
        for _ in 0..3 {
            let resp = client
                .post(mock.url())
                .header("content-type", "application/json")
                .body("{}")
                .send()
                .await
                .unwrap();
            codes.push(resp.status().as_u16());
        }

        assert_eq!(codes, vec![500, 201, 503]);
        assert_eq!(mock.request_count(), 3);
        assert_eq!(
            mock.requests()[0].content_type.as_deref(),
            Some("application/json")
        );
        assert_eq!(mock.requests()[2].body_str(), "{}");
    }

    #[tokio::test]
    async fn test_dropped_connection_is_transport_error() {
        let mock = MockEndpoint::dropping_first(1, [201]).await;
        let client = reqwest::Client::new();

        let first = client.post(mock.url()).body("{}").send().await;
        assert!(first.is_err());

        let second = client.post(mock.url()).body("{}").send().await.unwrap();
        assert_eq!(second.status().as_u16(), 201);
        assert_eq!(mock.dropped_connections(), 1);
        assert_eq!(mock.request_count(), 1);
    }
}
