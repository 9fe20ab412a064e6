//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use edge_proxy::config::ProxyConfig;
use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;

pub const TOKEN: &str = "test-upstream-token";

/// Counters shared with the mock upstream.
#[derive(Default)]
pub struct UpstreamStats {
    pub hits: AtomicUsize,
    pub flaky_calls: AtomicUsize,
}

impl UpstreamStats {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    pub stats: Arc<UpstreamStats>,
}

impl MockUpstream {
    /// Base URL the proxy should be pointed at.
    pub fn base_url(&self) -> String {
        format!("http://{}/3/", self.addr)
    }
}

/// Start a mock upstream API on an ephemeral port.
///
/// `/3/slow` sleeps past any test deadline, `/3/error` answers 500,
/// `/3/flaky` answers 503 once then 200. Everything else echoes the request.
pub async fn start_mock_upstream() -> MockUpstream {
    let stats = Arc::new(UpstreamStats::default());
    let app = Router::new()
        .route("/3/{*path}", any(echo))
        .with_state(stats.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, stats }
}

async fn echo(
    State(stats): State<Arc<UpstreamStats>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    stats.hits.fetch_add(1, Ordering::SeqCst);

    match path.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        "error" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status_message": "boom" })))
                .into_response();
        }
        "flaky" => {
            if stats.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
            }
        }
        _ => {}
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "method": method.as_str(),
        "path": path,
        "query": query,
        "authorization": header("authorization"),
        "cookie": headers.contains_key("cookie"),
        "accept_language": header("accept-language"),
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

/// Proxy configuration pointed at `upstream`, with retries off and the
/// credential set inline.
pub fn proxy_config(upstream: &MockUpstream) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream.base_url();
    config.upstream.api_token = Some(TOKEN.to_string());
    config.retries.enabled = false;
    config.timeouts.upstream_ms = 2_000;
    config
}

/// Start the proxy on an ephemeral port. Keep the returned `Shutdown` alive
/// for the duration of the test.
pub async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

/// Client that talks to the proxy directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
