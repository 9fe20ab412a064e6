//! Upstream URL resolution.
//!
//! The proxy only ever talks to one origin. Every inbound path is joined onto
//! the configured base URL, and the result must stay under that base.

use url::Url;

/// The configured upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base: Url,
}

impl UpstreamTarget {
    /// Parse the base URL. A trailing `/` is added so relative joins keep the
    /// base path (`/3` + `movie/1` would otherwise become `/movie/1`).
    pub fn parse(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// Join a mount-relative path (e.g. `/movie/550`) and query onto the base.
    ///
    /// The path is joined as `./{path}`, so a first segment such as
    /// `movie:550` stays a path segment instead of parsing as a URL scheme.
    /// Returns `None` when the join fails. The result is not guaranteed to be
    /// under the base; callers check with [`UpstreamTarget::contains`].
    pub fn resolve(&self, relative_path: &str, query: Option<&str>) -> Option<Url> {
        let relative = relative_path.strip_prefix('/').unwrap_or(relative_path);
        let mut url = self.base.join(&format!("./{relative}")).ok()?;
        url.set_query(query.filter(|q| !q.is_empty()));
        Some(url)
    }

    /// True if `url` points at the same origin and stays under the base path.
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.base.scheme()
            && url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
            && url.username().is_empty()
            && url.password().is_none()
            && url.path().starts_with(self.base.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> UpstreamTarget {
        UpstreamTarget::parse("https://api.themoviedb.org/3").unwrap()
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let root = target().resolve("/", None).unwrap();
        assert_eq!(root.as_str(), "https://api.themoviedb.org/3/");
        assert!(target().contains(&root));
    }

    #[test]
    fn test_resolve_keeps_base_path_and_query() {
        let url = target()
            .resolve("/movie/550", Some("language=en-US&page=2"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/550?language=en-US&page=2"
        );
        assert!(target().contains(&url));
    }

    #[test]
    fn test_empty_query_dropped() {
        let url = target().resolve("/configuration", Some("")).unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/configuration");
    }

    #[test]
    fn test_colon_in_first_segment_is_a_path() {
        let t = target();
        let url = t.resolve("/movie:550", None).unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/movie:550");
        assert!(t.contains(&url));
    }

    #[test]
    fn test_escape_attempts_stay_on_origin() {
        let t = target();

        let root_relative = t.resolve("//evil.example/steal", None).unwrap();
        assert_eq!(root_relative.host_str(), Some("api.themoviedb.org"));

        let absolute = t.resolve("/http://evil.example/", None).unwrap();
        assert_eq!(absolute.host_str(), Some("api.themoviedb.org"));
        assert!(t.contains(&absolute));

        let outside = Url::parse("https://evil.example/3/movie/550").unwrap();
        assert!(!t.contains(&outside));

        let traversal = t.resolve("/../4/account", None).unwrap();
        assert_eq!(traversal.path(), "/4/account");
        assert!(!t.contains(&traversal));
    }
}
