//! Per-client rate limiting middleware.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::ProxyError;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take a token, or return how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / refill_rate))
        }
    }
}

/// Shared limiter state, one bucket per client address.
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    enabled: bool,
    rps: f64,
    burst: f64,
    trust_forwarded_for: bool,
    idle_eviction: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            enabled: config.enabled,
            rps: config.requests_per_second as f64,
            burst: config.burst_size as f64,
            trust_forwarded_for: config.trust_forwarded_for,
            idle_eviction: Duration::from_secs(config.idle_eviction_secs),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Charge one request to `client`. On refusal, returns whole seconds to wait.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        let mut bucket = self
            .buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.burst));

        bucket
            .try_acquire(self.burst, self.rps)
            .map_err(|wait| wait.as_secs_f64().ceil().max(1.0) as u64)
    }

    /// Drop buckets untouched for longer than the idle window.
    pub fn evict_idle(&self) -> usize {
        let before = self.buckets.len();
        let idle = self.idle_eviction;
        self.buckets
            .retain(|_, bucket| bucket.last_update.elapsed() < idle);
        before - self.buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    pub fn idle_eviction(&self) -> Duration {
        self.idle_eviction
    }

    /// Client key: first `X-Forwarded-For` entry when trusted, else the peer.
    fn client_ip(&self, request: &Request<Body>) -> IpAddr {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|first| first.trim().parse::<IpAddr>().ok());
            if let Some(ip) = forwarded {
                return ip;
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.enabled() {
        return next.run(request).await;
    }

    let client = limiter.client_ip(&request);
    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(retry_after_secs) => {
            tracing::warn!(client = %client, retry_after_secs, "Rate limit exceeded");
            ProxyError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
