//! Header manipulation between client and upstream.
//!
//! # Responsibilities
//! - Copy only allowlisted client headers onto the upstream request
//! - Strip hop-by-hop headers in both directions
//! - Drop upstream CORS headers so the proxy's own policy applies
//!
//! # Design Decisions
//! - Allowlist, not denylist: client credentials and cookies never leave
//! - The upstream credential is set after copying, so it always wins

use axum::http::{header, HeaderMap, HeaderName};

/// Connection-scoped headers (RFC 9110 §7.6.1) plus `proxy-authorization`.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

/// Client headers that carry the client's own identity or target.
const NEVER_FORWARDED: [HeaderName; 4] = [
    header::AUTHORIZATION,
    header::COOKIE,
    header::HOST,
    header::PROXY_AUTHORIZATION,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// True if a client header may be copied upstream when allowlisted.
pub fn is_forwardable(name: &HeaderName) -> bool {
    !is_hop_by_hop(name) && !NEVER_FORWARDED.contains(name)
}

/// Copy the allowlisted headers from a client request.
pub fn copy_allowed(incoming: &HeaderMap, allowlist: &[HeaderName]) -> HeaderMap {
    let mut out = HeaderMap::new();
    for name in allowlist {
        if !is_forwardable(name) {
            continue;
        }
        for value in incoming.get_all(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Headers from an upstream response that are safe to relay to the client.
pub fn sanitize_response(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name)
            || name == header::CONTENT_LENGTH
            || name.as_str().starts_with("access-control-")
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_copy_allowed_drops_everything_else() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));
        incoming.insert(header::COOKIE, HeaderValue::from_static("session=1"));

        let out = copy_allowed(&incoming, &[header::ACCEPT, header::CONNECTION]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(header::ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_client_credentials_never_copied() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));
        incoming.insert(header::COOKIE, HeaderValue::from_static("session=1"));
        incoming.insert(header::HOST, HeaderValue::from_static("proxy.example"));

        let out = copy_allowed(
            &incoming,
            &[header::AUTHORIZATION, header::COOKIE, header::HOST],
        );
        assert!(out.is_empty());
        assert!(is_forwardable(&header::ACCEPT_LANGUAGE));
        assert!(!is_forwardable(&header::PROXY_AUTHORIZATION));
    }

    #[test]
    fn test_sanitize_response() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        upstream.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        upstream.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        upstream.insert(header::ETAG, HeaderValue::from_static("\"abc\""));

        let out = sanitize_response(&upstream);
        assert_eq!(out.len(), 2);
        assert!(out.contains_key(header::CONTENT_TYPE));
        assert!(out.contains_key(header::ETAG));
    }
}
