//! In-memory TTL cache for successful relay payloads.
//!
//! The portal re-issues identical requests often (pagination back and
//! forward, repeated suggest calls while typing), so successful payloads
//! are kept in a bounded [`moka`] cache keyed by the logical request. The
//! cache is instance-owned by the search service rather than the
//! orchestrator: a cache hit must not touch endpoint health state.

use std::time::Duration;

use moka::future::Cache;

use crate::request::SearchRequest;
use crate::types::SearchResponse;

/// Maximum number of cached payloads.
const MAX_CACHE_ENTRIES: u64 = 100;

/// Composite cache key: vertical path + canonicalised query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: &'static str,
    params: String,
}

impl CacheKey {
    /// Build a deterministic key from a logical request.
    ///
    /// Parameters are sorted by name so insertion order does not split
    /// cache entries; the key is the logical request, not the encoded URL,
    /// so it is identical across endpoint mirrors.
    pub fn from_request(request: &SearchRequest) -> Self {
        let mut params: Vec<_> = request.params().to_vec();
        params.sort();
        let params = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            path: request.vertical().path(),
            params,
        }
    }
}

/// Instance-owned response cache with TTL and bounded capacity.
pub struct ResponseCache {
    inner: Cache<CacheKey, SearchResponse>,
}

impl ResponseCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Look up a cached payload. Returns `None` on miss or expiry.
    pub async fn get(&self, key: &CacheKey) -> Option<SearchResponse> {
        self.inner.get(key).await
    }

    /// Insert a successful payload.
    pub async fn insert(&self, key: CacheKey, response: SearchResponse) {
        self.inner.insert(key, response).await;
    }
}
