//! High-level search service: request building, caching, orchestration.
//!
//! [`SearchService`] is the fetch orchestrator's only caller. It builds
//! logical requests from portal-level settings (safe search, vertical),
//! consults the response cache, and delegates misses to the orchestrator.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheKey, ResponseCache};
use crate::config::PortalConfig;
use crate::error::FetchError;
use crate::health::EndpointHealth;
use crate::orchestrator::FetchOrchestrator;
use crate::request::SearchRequest;
use crate::types::{SearchResponse, SearchVertical};

/// Portal-facing search entry point.
///
/// Health and cache state live for the service's lifetime; hold one
/// service per portal session rather than building one per request.
pub struct SearchService {
    config: PortalConfig,
    orchestrator: FetchOrchestrator,
    cache: Option<ResponseCache>,
}

impl SearchService {
    /// Build a service from portal configuration.
    ///
    /// A `cache_ttl_seconds` of 0 disables the response cache entirely.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] for invalid configuration or
    /// [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: PortalConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let orchestrator = FetchOrchestrator::new(config.clone())?;
        let cache = (config.cache_ttl_seconds > 0)
            .then(|| ResponseCache::new(Duration::from_secs(config.cache_ttl_seconds)));
        Ok(Self {
            config,
            orchestrator,
            cache,
        })
    }

    /// Build a request for `vertical` carrying the portal-level flags.
    pub fn request(&self, vertical: SearchVertical, query: &str) -> SearchRequest {
        SearchRequest::new(vertical)
            .query(query)
            .safe_search(self.config.safe_search)
    }

    /// Run a web search for `query`.
    pub async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, FetchError> {
        self.execute(&self.request(SearchVertical::Web, query), cancel)
            .await
    }

    /// Fetch query completions for a search-box prefix.
    ///
    /// Suggest requests skip the safe-search flag; workers apply their own
    /// filtering to completions.
    pub async fn suggest(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, FetchError> {
        self.execute(
            &SearchRequest::new(SearchVertical::Suggest).query(prefix),
            cancel,
        )
        .await
    }

    /// Execute a prepared request, consulting the cache first.
    ///
    /// Cache hits return immediately without touching endpoint health;
    /// misses go through the orchestrator and successful payloads are
    /// cached.
    pub async fn execute(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, FetchError> {
        let key = CacheKey::from_request(request);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                debug!(vertical = %request.vertical(), "cache hit");
                return Ok(hit);
            }
        }

        let response = self.orchestrator.fetch(request, cancel).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, response.clone()).await;
        }
        Ok(response)
    }

    /// Health snapshot for every configured endpoint.
    pub fn health_report(&self) -> Vec<(String, EndpointHealth)> {
        self.orchestrator.health_report()
    }

    /// The underlying orchestrator, for direct request execution.
    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }
}
