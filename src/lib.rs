//! # relay-search
//!
//! Resilient search client for a portal backed by redundant relay worker
//! endpoints.
//!
//! The portal front-end issues one logical request per search; this crate
//! executes it against an ordered endpoint set (one primary, N fallback
//! mirrors):
//!
//! - Endpoints are swept strictly in priority order, one attempt at a time,
//!   each bounded by a per-attempt timeout
//! - The first 2xx response carrying a non-empty JSON payload wins and
//!   short-circuits the sweep
//! - Exhausted sweeps are retried with linearly growing backoff up to a
//!   configured bound
//! - Every outcome feeds a per-endpoint health record (decaying credit
//!   counters plus a smoothed latency average) exposed for telemetry
//! - Callers see exactly two terminal errors: all endpoints failed, or the
//!   request was cancelled
//!
//! ## Security
//!
//! - Requests are CORS-simple GETs: `Accept: application/json`, no
//!   `Content-Type`, so worker mirrors never see a pre-flight
//! - Search queries are logged only at trace level
//! - No network listeners: this is a client library, not a server

pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod orchestrator;
pub mod request;
pub mod service;
pub mod types;

pub use config::{PortalConfig, SweepStrategy};
pub use error::{FetchError, Result};
pub use health::{EndpointHealth, EndpointHealthTracker, HealthConfig};
pub use orchestrator::FetchOrchestrator;
pub use request::SearchRequest;
pub use service::SearchService;
pub use types::{SearchResponse, SearchVertical};

/// Run a single web search against the configured portal endpoints.
///
/// Convenience wrapper that builds a [`SearchService`] per call. Health and
/// cache state start fresh each time; callers wanting continuity across
/// requests should hold a [`SearchService`] instead.
///
/// # Errors
///
/// Returns [`FetchError::AllEndpointsFailed`] if every endpoint fails in
/// every retry cycle, or a config/client error if `config` is invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> relay_search::Result<()> {
/// let config = relay_search::PortalConfig::default();
/// let response = relay_search::search("rust programming", &config).await?;
/// if let Some(results) = response.results() {
///     println!("{results}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &PortalConfig) -> Result<SearchResponse> {
    config.validate()?;
    let service = SearchService::new(config.clone())?;
    let cancel = tokio_util::sync::CancellationToken::new();
    service.search(query, &cancel).await
}
