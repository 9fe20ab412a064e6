//! Retry policy.
//!
//! # Design Decisions
//! - Only GET and HEAD are retried; writes reach the upstream at most once
//! - Connection errors are retryable; of the 5xx family only 502/503/504
//! - Retries share the request's upstream deadline, they never extend it

use axum::http::{Method, StatusCode};

/// Decide whether an attempt that ended with `status` (or a network error)
/// should be tried again.
pub fn is_retryable(method: &Method, status: Option<StatusCode>, network_error: bool) -> bool {
    if *method != Method::GET && *method != Method::HEAD {
        return false;
    }

    if network_error {
        return true;
    }

    status.is_some_and(|s| {
        s == StatusCode::BAD_GATEWAY
            || s == StatusCode::SERVICE_UNAVAILABLE
            || s == StatusCode::GATEWAY_TIMEOUT
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reads_are_retried() {
        assert!(is_retryable(&Method::GET, None, true));
        assert!(is_retryable(&Method::HEAD, Some(StatusCode::SERVICE_UNAVAILABLE), false));
        assert!(!is_retryable(&Method::POST, None, true));
        assert!(!is_retryable(&Method::DELETE, Some(StatusCode::BAD_GATEWAY), false));
    }

    #[test]
    fn test_status_classes() {
        assert!(is_retryable(&Method::GET, Some(StatusCode::GATEWAY_TIMEOUT), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::INTERNAL_SERVER_ERROR), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::NOT_FOUND), false));
        assert!(!is_retryable(&Method::GET, Some(StatusCode::OK), false));
    }
}
