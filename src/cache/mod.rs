//! In-memory response cache.
//!
//! # Design Decisions
//! - Keyed by method + upstream URL; only GET is looked up, only 2xx stored
//! - Bounded: when full, the least recently *inserted* entry goes first
//! - Expired entries are dropped lazily on access
//! - The insertion queue carries a sequence number per entry, so a replaced
//!   key's stale queue slot never evicts the newer value

use axum::http::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::CacheConfig;
use crate::http::response::ProxiedResponse;

/// Build the cache key for a request.
pub fn cache_key(method: &Method, url: &Url) -> String {
    format!("{} {}", method, url)
}

struct CacheEntry {
    response: ProxiedResponse,
    inserted_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<(u64, String)>,
    next_seq: u64,
}

impl CacheInner {
    /// Returns false once the queue is exhausted.
    fn evict_oldest(&mut self) -> bool {
        while let Some((seq, key)) = self.order.pop_front() {
            let live = self.entries.get(&key).is_some_and(|e| e.seq == seq);
            if live {
                self.entries.remove(&key);
                return true;
            }
        }
        false
    }

    /// Drop queue slots whose entry was replaced or removed.
    fn compact(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(seq, key)| entries.get(key).is_some_and(|e| e.seq == *seq));
    }
}

/// A bounded, thread-safe cache of upstream responses.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl ResponseCache {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries,
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        Self::new(config.max_entries, ttl)
    }

    /// Fetch a live entry.
    pub fn get(&self, key: &str) -> Option<ProxiedResponse> {
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");

        let expired = match inner.entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => return None,
        };

        if expired {
            inner.entries.remove(key);
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }

        inner.entries.get(key).map(|entry| entry.response.clone())
    }

    /// Store a response, evicting the oldest insertions when full.
    pub fn insert(&self, key: String, response: ProxiedResponse) {
        if self.max_entries == 0 {
            return;
        }

        let mut inner = self.inner.lock().expect("response cache mutex poisoned");

        if !inner.entries.contains_key(&key) {
            while inner.entries.len() >= self.max_entries && inner.evict_oldest() {}
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.push_back((seq, key.clone()));
        inner.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
                seq,
            },
        );

        if inner.order.len() > self.max_entries * 2 {
            inner.compact();
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("response cache mutex poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("response cache mutex poisoned");
        inner.entries.clear();
        inner.order.clear();
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};

    fn response(body: &'static str) -> ProxiedResponse {
        ProxiedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn body(cache: &ResponseCache, key: &str) -> Option<Bytes> {
        cache.get(key).map(|r| r.body)
    }

    #[test]
    fn test_cache_key_includes_method_and_query() {
        let url = Url::parse("https://api.themoviedb.org/3/movie/550?language=de").unwrap();
        assert_eq!(
            cache_key(&Method::GET, &url),
            "GET https://api.themoviedb.org/3/movie/550?language=de"
        );
    }

    #[test]
    fn test_evicts_least_recently_inserted() {
        let cache = ResponseCache::new(2, None);
        cache.insert("a".into(), response("a"));
        cache.insert("b".into(), response("b"));

        // Reading does not refresh position.
        assert!(cache.get("a").is_some());

        cache.insert("c".into(), response("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(body(&cache, "b").unwrap(), "b");
        assert_eq!(body(&cache, "c").unwrap(), "c");
    }

    #[test]
    fn test_reinsert_counts_as_fresh_insertion() {
        let cache = ResponseCache::new(2, None);
        cache.insert("a".into(), response("a1"));
        cache.insert("b".into(), response("b"));
        cache.insert("a".into(), response("a2"));

        cache.insert("c".into(), response("c"));
        assert!(cache.get("b").is_none());
        assert_eq!(body(&cache, "a").unwrap(), "a2");
    }

    #[test]
    fn test_replacing_keys_keeps_queue_bounded() {
        let cache = ResponseCache::new(2, None);
        for _ in 0..100 {
            cache.insert("a".into(), response("a"));
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.inner.lock().unwrap().order.len() <= 4);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ResponseCache::new(10, Some(Duration::from_millis(20)));
        cache.insert("a".into(), response("a"));
        assert!(cache.get("a").is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = ResponseCache::new(0, None);
        cache.insert("a".into(), response("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::from_config(&CacheConfig::default());
        cache.insert("a".into(), response("a"));
        cache.clear();
        assert!(cache.get("a").is_none());
    }
}
