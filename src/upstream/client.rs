//! HTTP client for the upstream API.

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, Method},
};
use std::time::Duration;
use url::Url;

use crate::config::{RetryConfig, UpstreamConfig};
use crate::error::{ProxyError, StartupError};
use crate::http::response::ProxiedResponse;
use crate::resilience::{calculate_backoff, is_retryable};
use crate::security::headers::{copy_allowed, is_forwardable, sanitize_response};

/// Forwards requests to the upstream with the static credential attached.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    credential_header: HeaderName,
    credential: HeaderValue,
    forward_headers: Vec<HeaderName>,
    retry: RetryConfig,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("credential_header", &self.credential_header)
            .field("forward_headers", &self.forward_headers)
            .finish_non_exhaustive()
    }
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, retry: &RetryConfig) -> Result<Self, StartupError> {
        let credential_header = HeaderName::from_bytes(config.credential_header.as_bytes())
            .map_err(|e| StartupError::Credential(e.to_string()))?;

        let mut credential = HeaderValue::from_str(&config.credential_value()).map_err(|e| StartupError::Credential(e.to_string()))?;
        credential.set_sensitive(true);

        let forward_headers = config
            .forward_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .filter(|name| *name != credential_header && is_forwardable(name))
            .collect();

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("edge-proxy/", env!("CARGO_PKG_VERSION")))
            // Redirects are relayed to the client, never followed off-origin.
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            credential_header,
            credential,
            forward_headers,
            retry: retry.clone(),
        })
    }

    /// Headers sent upstream: the allowlisted client headers plus the credential.
    pub fn outbound_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = copy_allowed(incoming, &self.forward_headers);
        headers.insert(self.credential_header.clone(), self.credential.clone());
        headers
    }

    /// Perform the upstream call, retrying idempotent reads on transient failure.
    ///
    /// The body is only sent for methods other than GET and HEAD.
    pub async fn fetch(
        &self,
        method: Method,
        url: Url,
        incoming: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxiedResponse, ProxyError> {
        let headers = self.outbound_headers(incoming);
        let send_body = method != Method::GET && method != Method::HEAD;
        let max_attempts = if self.retry.enabled {
            self.retry.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if send_body {
                request = request.body(body.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if attempt < max_attempts && is_retryable(&method, Some(status), false) {
                        let delay = calculate_backoff(attempt, &self.retry);
                        tracing::info!(attempt, status = %status, delay = ?delay, "Retrying upstream request");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let headers = sanitize_response(response.headers());
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

                    tracing::debug!(status = %status, bytes = body.len(), "Upstream responded");
                    return Ok(ProxiedResponse {
                        status,
                        headers,
                        body,
                    });
                }
                Err(e) => {
                    if attempt < max_attempts && is_retryable(&method, None, true) {
                        let delay = calculate_backoff(attempt, &self.retry);
                        tracing::info!(attempt, error = %e, delay = ?delay, "Retrying after network error");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(ProxyError::Upstream(e.to_string()));
                }
            }
        }
    }
}
