//! Upstream path validation.
//!
//! Keeps every forwarded request on the configured upstream origin and under
//! its base path, so a crafted path can never turn the proxy into a
//! general-purpose fetcher.

use crate::error::ProxyError;
use crate::pipeline::{Guard, RequestContext};
use crate::upstream::UpstreamTarget;

/// Percent-encodings of `.`, `/`, `\` and NUL.
const ENCODED_SEPARATORS: [&str; 4] = ["%2e", "%2f", "%5c", "%00"];

#[derive(Debug, Clone)]
pub struct PathGuard {
    target: UpstreamTarget,
}

impl PathGuard {
    pub fn new(target: UpstreamTarget) -> Self {
        Self { target }
    }
}

/// Structural checks on the raw relative path, before any URL resolution.
fn check_raw_path(path: &str) -> Result<(), &'static str> {
    if path.starts_with("//") {
        return Err("leading double slash");
    }
    if path.contains('\\') || path.contains('\0') {
        return Err("forbidden character");
    }

    let lowered = path.to_ascii_lowercase();
    if ENCODED_SEPARATORS.iter().any(|enc| lowered.contains(enc)) {
        return Err("encoded separator");
    }

    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err("dot segment");
    }

    Ok(())
}

impl Guard for PathGuard {
    fn name(&self) -> &'static str {
        "path"
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError> {
        check_raw_path(&ctx.path).map_err(|reason| ProxyError::InvalidPath { reason })?;

        match &ctx.upstream_url {
            Some(url) if self.target.contains(url) => Ok(()),
            Some(url) => {
                tracing::warn!(path = %ctx.path, resolved = %url, "Path resolved outside upstream");
                Err(ProxyError::InvalidPath {
                    reason: "resolves outside upstream",
                })
            }
            None => Err(ProxyError::InvalidPath {
                reason: "unresolvable path",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn check(uri: &str) -> Result<(), ProxyError> {
        let target = UpstreamTarget::parse("https://api.themoviedb.org/3/").unwrap();
        let (parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        let ctx = RequestContext::from_parts(&parts, "/api", &target);
        PathGuard::new(target).check(&ctx)
    }

    fn reason(uri: &str) -> &'static str {
        match check(uri) {
            Err(ProxyError::InvalidPath { reason }) => reason,
            other => panic!("{uri}: unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_accepts_ordinary_paths() {
        assert!(check("/api/movie/550").is_ok());
        assert!(check("/api/search/movie?query=alien").is_ok());
        assert!(check("/api/tv/1399/season/1/episode/1").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(reason("/api/../secret"), "dot segment");
        assert_eq!(reason("/api/movie/./550"), "dot segment");
        assert_eq!(reason("/api/%2e%2e/secret"), "encoded separator");
        assert_eq!(reason("/api/movie%2F550"), "encoded separator");
    }

    #[test]
    fn test_rejects_origin_escapes() {
        assert_eq!(reason("/api//evil.example/x"), "leading double slash");
    }

    #[test]
    fn test_scheme_like_segments_stay_on_upstream() {
        assert!(check("/api/movie:550").is_ok());
        assert!(check("/api/http://evil.example/").is_ok());
    }
}
