//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and health handlers
//! - Wire up middleware (request ID, tracing, access log, CORS, rate limit)
//! - Run the validation pipeline, cache and upstream fetch per request
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware,
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::cache::{cache_key, ResponseCache};
use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::error::{ProxyError, StartupError};
use crate::http::cors::cors_layer;
use crate::http::request::MakeRequestUuidV4;
use crate::http::response::{CacheStatus, ProxiedResponse};
use crate::observability::access_log_middleware;
use crate::pipeline::{GuardChain, RequestContext};
use crate::security::methods::parse_methods;
use crate::security::{rate_limit_middleware, RateLimiter};
use crate::upstream::{UpstreamClient, UpstreamTarget};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mount_path: Arc<str>,
    pub target: Arc<UpstreamTarget>,
    pub guards: Arc<GuardChain>,
    pub upstream: UpstreamClient,
    pub cache: Option<Arc<ResponseCache>>,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(|e| StartupError::Config(ConfigError::Validation(e)))?;

        let target = UpstreamTarget::parse(&config.upstream.base_url)?;
        let guards = GuardChain::from_config(&config, &target);
        let upstream = UpstreamClient::new(&config.upstream, &config.retries)?;
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ResponseCache::from_config(&config.cache)));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        let state = AppState {
            mount_path: Arc::from(config.proxy.mount_path.as_str()),
            target: Arc::new(target),
            guards: Arc::new(guards),
            upstream,
            cache,
            upstream_timeout: Duration::from_millis(config.timeouts.upstream_ms),
            max_body_bytes: config.proxy.max_body_bytes,
        };

        let router = Self::build_router(&config, state, limiter.clone());
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom on the way in: request ID, trace, access log,
    /// CORS, rate limit, then the handler.
    fn build_router(config: &ProxyConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let mount = config.proxy.mount_path.as_str();
        let methods = parse_methods(&config.proxy.allowed_methods);

        // The bare mount (with or without a trailing slash) maps to the base URL.
        let mut router = Router::new().route("/healthz", get(health_handler));
        router = if mount == "/" {
            router
                .route("/", any(proxy_handler))
                .route("/{*path}", any(proxy_handler))
        } else {
            router
                .route(mount, any(proxy_handler))
                .route(&format!("{mount}/"), any(proxy_handler))
                .route(&format!("{mount}/{{*path}}"), any(proxy_handler))
        };

        router
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn(access_log_middleware))
                    .layer(cors_layer(&config.cors, &methods))
                    .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.proxy.mount_path,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        if self.limiter.enabled() {
            spawn_limiter_sweeper(self.limiter.clone(), shutdown.resubscribe());
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

}

/// Periodically drop idle rate-limit buckets.
fn spawn_limiter_sweeper(limiter: Arc<RateLimiter>, mut shutdown: broadcast::Receiver<()>) {
    let period = limiter.idle_eviction().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = limiter.evict_idle();
                    if evicted > 0 {
                        tracing::debug!(evicted, remaining = limiter.tracked_clients(), "Evicted idle rate-limit buckets");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}

/// Main proxy handler: guards, bounded body read, then cache and upstream
/// under the upstream deadline.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts, &state.mount_path, &state.target);

    state.guards.check(&ctx)?;

    let url = ctx.upstream_url.clone().ok_or(ProxyError::InvalidPath {
        reason: "unresolvable path",
    })?;

    // Any read failure here means the body will not be forwarded; the limit
    // is the only failure a well-behaved client can cause.
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|_| ProxyError::PayloadTooLarge {
            limit: state.max_body_bytes,
        })?;

    let (response, cache_status) = tokio::time::timeout(
        state.upstream_timeout,
        fetch_through_cache(&state, &ctx.method, url, &parts.headers, body),
    )
    .await
    .map_err(|_| ProxyError::UpstreamTimeout)??;

    Ok(response.into_client_response(cache_status))
}

/// Serve GETs from the cache when possible; store successful GET responses.
async fn fetch_through_cache(
    state: &AppState,
    method: &Method,
    url: Url,
    headers: &HeaderMap,
    body: axum::body::Bytes,
) -> Result<(ProxiedResponse, CacheStatus), ProxyError> {
    let cache = match &state.cache {
        Some(cache) if *method == Method::GET => Some((cache, cache_key(method, &url))),
        _ => None,
    };

    if let Some((cache, key)) = &cache {
        if let Some(hit) = cache.get(key) {
            tracing::debug!(key = %key, "Cache hit");
            return Ok((hit, CacheStatus::Hit));
        }
    }

    let response = state
        .upstream
        .fetch(method.clone(), url, headers, body)
        .await?;

    match cache {
        Some((cache, key)) => {
            if response.status.is_success() {
                cache.insert(key, response.clone());
            }
            Ok((response, CacheStatus::Miss))
        }
        None => Ok((response, CacheStatus::Bypass)),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub cache_entries: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache_entries: state.cache.as_ref().map_or(0, |c| c.len()),
    })
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}
