//! Fetch orchestration across redundant relay endpoints.
//!
//! A logical request is executed as a series of sweeps over the configured
//! endpoint list in fixed priority order: primary first, then fallbacks as
//! listed. The first attempt that returns HTTP 2xx with a non-empty JSON
//! object short-circuits the sweep. A sweep with no success is one failed
//! cycle; cycles repeat with linearly growing backoff until the retry
//! budget is exhausted, at which point the caller sees a single aggregate
//! [`FetchError::AllEndpointsFailed`].
//!
//! Every attempt outcome is recorded to the endpoint health tracker, but
//! health never gates or reorders the sweep: an unhealthy endpoint is still
//! attempted in its configured position. Health is telemetry here, read
//! back through [`FetchOrchestrator::health_report`].
//!
//! Cancellation is caller-driven via [`CancellationToken`]. Both in-flight
//! attempts and backoff sleeps race the token; cancelling abandons the
//! cycle immediately, records no outcome for the attempt that was in
//! flight, and surfaces [`FetchError::Cancelled`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{PortalConfig, SweepStrategy};
use crate::error::FetchError;
use crate::health::{EndpointHealth, EndpointHealthTracker};
use crate::http;
use crate::request::SearchRequest;
use crate::types::SearchResponse;

/// Per-attempt failure, internal to the sweep loop.
///
/// Normalized to a plain "endpoint failure" for health and retry purposes;
/// the variant only survives into the aggregate error message.
#[derive(Debug)]
enum AttemptFailure {
    /// The endpoint base could not be combined into a request URL.
    Url(String),
    /// The attempt exceeded the per-attempt timeout.
    Timeout,
    /// Connect or transport-level error.
    Http(String),
    /// The worker answered with a non-2xx status.
    Status(reqwest::StatusCode),
    /// The body was missing, not JSON, not an object, or an empty object.
    Payload(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(msg) => write!(f, "bad endpoint URL: {msg}"),
            Self::Timeout => f.write_str("timed out"),
            Self::Http(msg) => write!(f, "transport error: {msg}"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Payload(msg) => write!(f, "bad payload: {msg}"),
        }
    }
}

/// Result of one full endpoint sweep.
enum SweepOutcome {
    /// An endpoint delivered a usable payload; the sweep short-circuited.
    Success(SearchResponse),
    /// Every endpoint failed; per-endpoint summaries for the aggregate.
    Failed(Vec<String>),
}

/// Executes logical requests reliably across an ordered, partially
/// unreliable endpoint set.
///
/// The orchestrator owns the HTTP client and the health tracker; concurrent
/// logical requests on the same orchestrator share both. The tracker is the
/// only mutable shared state and sits behind a mutex that is never held
/// across an await.
#[derive(Debug)]
pub struct FetchOrchestrator {
    config: PortalConfig,
    client: reqwest::Client,
    endpoints: Vec<String>,
    health: Arc<Mutex<EndpointHealthTracker>>,
}

impl FetchOrchestrator {
    /// Create an orchestrator with a fresh health tracker covering the
    /// configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if the configuration is invalid, or
    /// [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: PortalConfig) -> Result<Self, FetchError> {
        let endpoints = config.endpoints();
        let tracker = EndpointHealthTracker::new(endpoints.iter().cloned());
        Self::with_tracker(config, tracker)
    }

    /// Create an orchestrator around an injected health tracker, for a
    /// custom clock or thresholds.
    pub fn with_tracker(
        config: PortalConfig,
        tracker: EndpointHealthTracker,
    ) -> Result<Self, FetchError> {
        config.validate()?;
        let client = http::build_client(&config)?;
        let endpoints = config.endpoints();
        Ok(Self {
            config,
            client,
            endpoints,
            health: Arc::new(Mutex::new(tracker)),
        })
    }

    /// The endpoint sweep order this orchestrator uses.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Health snapshot for a single endpoint.
    pub fn health(&self, endpoint: &str) -> Option<EndpointHealth> {
        self.lock_health().health(endpoint)
    }

    /// Health snapshot for every tracked endpoint.
    pub fn health_report(&self) -> Vec<(String, EndpointHealth)> {
        self.lock_health().health_report()
    }

    /// Execute one logical request.
    ///
    /// Sweeps the endpoint list, retrying full sweeps with linear backoff
    /// (`backoff_base_ms * retry_number`) up to `max_retries` times. The
    /// first usable payload is returned immediately.
    ///
    /// # Errors
    ///
    /// - [`FetchError::AllEndpointsFailed`] once every endpoint has failed
    ///   in every cycle.
    /// - [`FetchError::Cancelled`] if `cancel` fires first.
    pub async fn fetch(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, FetchError> {
        let mut last_sweep_errors = Vec::new();

        for cycle in 0..=self.config.max_retries {
            if cycle > 0 {
                let delay = Duration::from_millis(self.config.backoff_base_ms * u64::from(cycle));
                debug!(
                    cycle,
                    delay_ms = delay.as_millis() as u64,
                    "sweep failed, backing off before retry"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(FetchError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            let outcome = match self.config.strategy {
                SweepStrategy::Sequential => self.sweep_sequential(request, cancel).await?,
                SweepStrategy::Race => self.sweep_race(request, cancel).await?,
            };
            match outcome {
                SweepOutcome::Success(response) => return Ok(response),
                SweepOutcome::Failed(errors) => last_sweep_errors = errors,
            }
        }

        Err(FetchError::AllEndpointsFailed(format!(
            "{} cycles exhausted: {}",
            self.config.max_retries + 1,
            last_sweep_errors.join("; ")
        )))
    }

    /// One sequential sweep: endpoints tried one at a time in priority
    /// order, first success short-circuits.
    async fn sweep_sequential(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SweepOutcome, FetchError> {
        let mut errors = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                outcome = self.attempt(endpoint, request) => outcome,
            };
            match outcome {
                Ok((response, elapsed_ms)) => {
                    self.lock_health().record_success(endpoint, elapsed_ms);
                    debug!(endpoint = %endpoint, elapsed_ms, "attempt succeeded");
                    return Ok(SweepOutcome::Success(response));
                }
                Err(failure) => {
                    self.lock_health().record_failure(endpoint);
                    warn!(endpoint = %endpoint, error = %failure, "attempt failed, trying next endpoint");
                    errors.push(format!("{endpoint}: {failure}"));
                }
            }
        }

        Ok(SweepOutcome::Failed(errors))
    }

    /// One racing sweep: every endpoint attempted concurrently, first
    /// success wins and the remaining attempts are dropped unrecorded.
    async fn sweep_race(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SweepOutcome, FetchError> {
        let mut attempts: FuturesUnordered<_> = self
            .endpoints
            .iter()
            .map(|endpoint| {
                let attempt = self.attempt(endpoint, request);
                async move { (endpoint.as_str(), attempt.await) }
            })
            .collect();

        let mut errors = Vec::with_capacity(self.endpoints.len());
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                next = attempts.next() => next,
            };
            match next {
                Some((endpoint, Ok((response, elapsed_ms)))) => {
                    self.lock_health().record_success(endpoint, elapsed_ms);
                    debug!(endpoint = %endpoint, elapsed_ms, "raced attempt succeeded");
                    return Ok(SweepOutcome::Success(response));
                }
                Some((endpoint, Err(failure))) => {
                    self.lock_health().record_failure(endpoint);
                    warn!(endpoint = %endpoint, error = %failure, "raced attempt failed");
                    errors.push(format!("{endpoint}: {failure}"));
                }
                None => return Ok(SweepOutcome::Failed(errors)),
            }
        }
    }

    /// One network attempt against one endpoint.
    ///
    /// Success requires a 2xx status and a body that parses to a non-empty
    /// JSON object. Returns the payload with the observed elapsed time in
    /// milliseconds for the health tracker's latency average.
    async fn attempt(
        &self,
        endpoint: &str,
        request: &SearchRequest,
    ) -> Result<(SearchResponse, f64), AttemptFailure> {
        let url = request
            .to_url(endpoint)
            .map_err(|e| AttemptFailure::Url(e.to_string()))?;
        trace!(url = %url, "attempting relay endpoint");

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::Status(status));
        }

        let value: serde_json::Value = response.json().await.map_err(classify_reqwest_error)?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let payload = SearchResponse::from_value(value)
            .ok_or_else(|| AttemptFailure::Payload("not a JSON object".into()))?;
        if payload.is_empty() {
            return Err(AttemptFailure::Payload("empty object".into()));
        }
        Ok((payload, elapsed_ms))
    }

    fn lock_health(&self) -> MutexGuard<'_, EndpointHealthTracker> {
        self.health.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> AttemptFailure {
    if e.is_timeout() {
        AttemptFailure::Timeout
    } else if e.is_decode() {
        AttemptFailure::Payload(format!("invalid JSON: {e}"))
    } else {
        AttemptFailure::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchVertical;

    fn test_config() -> PortalConfig {
        PortalConfig {
            primary_endpoint: "https://primary.example".into(),
            fallback_endpoints: vec![
                "https://mirror-1.example".into(),
                "https://mirror-2.example".into(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn construction_validates_config() {
        let config = PortalConfig {
            primary_endpoint: "not a url".into(),
            ..Default::default()
        };
        let err = FetchOrchestrator::new(config).err().expect("must fail");
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn endpoints_in_priority_order() {
        let orchestrator = FetchOrchestrator::new(test_config()).expect("valid config");
        assert_eq!(
            orchestrator.endpoints(),
            &[
                "https://primary.example",
                "https://mirror-1.example",
                "https://mirror-2.example"
            ]
        );
    }

    #[test]
    fn tracker_starts_healthy_for_all_endpoints() {
        let orchestrator = FetchOrchestrator::new(test_config()).expect("valid config");
        let report = orchestrator.health_report();
        assert_eq!(report.len(), 3);
        assert!(report.iter().all(|(_, h)| h.healthy));
    }

    #[test]
    fn health_accessor_for_unknown_endpoint() {
        let orchestrator = FetchOrchestrator::new(test_config()).expect("valid config");
        assert!(orchestrator.health("https://unknown.example").is_none());
    }

    #[test]
    fn attempt_failure_display() {
        assert_eq!(AttemptFailure::Timeout.to_string(), "timed out");
        assert_eq!(
            AttemptFailure::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE).to_string(),
            "HTTP 503 Service Unavailable"
        );
        assert_eq!(
            AttemptFailure::Payload("empty object".into()).to_string(),
            "bad payload: empty object"
        );
        assert!(AttemptFailure::Url("bad base".into())
            .to_string()
            .contains("bad endpoint URL"));
    }

    #[tokio::test]
    async fn pre_cancelled_token_yields_cancelled() {
        let orchestrator = FetchOrchestrator::new(test_config()).expect("valid config");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = SearchRequest::new(SearchVertical::Web).query("cats");
        let err = orchestrator.fetch(&request, &cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));

        // Nothing was attempted, so nothing was recorded.
        let report = orchestrator.health_report();
        assert!(report.iter().all(|(_, h)| h.last_check_at.is_none()));
    }
}
