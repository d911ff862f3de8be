//! Per-endpoint health tracking for relay workers.
//!
//! Each endpoint carries a pair of decaying credits instead of strict
//! consecutive-run counters: an outcome increments its own credit and
//! decrements the opposite one (floored at zero). A single failure after a
//! long healthy streak therefore does not threaten an endpoint's standing,
//! and a lone success does not instantly rehabilitate a failing one.
//!
//! An endpoint is marked unhealthy when failure credit reaches the
//! configured threshold. It recovers when success credit reaches the
//! recovery threshold, or unconditionally once a grace period has elapsed
//! since it was marked unhealthy, whichever comes first. Grace recovery is
//! evaluated lazily against an injectable [`Clock`] whenever a record is
//! read or updated; there are no timers to leak or to fake in tests.
//!
//! Health state is observational: the fetch orchestrator records every
//! outcome here but never consults it to skip or reorder endpoints.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Weight of a new latency sample in the smoothed response-time average.
/// The previous average keeps the remaining 0.7.
const EMA_NEW_SAMPLE_WEIGHT: f64 = 0.3;

/// Time source for health bookkeeping.
///
/// Production code uses [`SystemClock`]; tests inject a manual clock to
/// drive grace-period recovery deterministically.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Configuration for health transitions.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Failure credit at which an endpoint is marked unhealthy.
    pub unhealthy_threshold: u32,
    /// Success credit at which an endpoint is marked healthy again.
    pub recovery_threshold: u32,
    /// How long an endpoint stays unhealthy before it is unconditionally
    /// reset to healthy with zero failure credit.
    pub recovery_grace: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            unhealthy_threshold: 3,
            recovery_threshold: 3,
            recovery_grace: Duration::from_secs(300),
        }
    }
}

/// Snapshot of a single endpoint's health record.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointHealth {
    /// Whether the endpoint is currently considered healthy.
    pub healthy: bool,
    /// Decaying count of recent successes.
    pub success_credit: u32,
    /// Decaying count of recent failures.
    pub failure_credit: u32,
    /// Smoothed response time in milliseconds. `None` until the first
    /// successful attempt; the first sample is taken exactly.
    pub smoothed_response_ms: Option<f64>,
    /// When the last outcome (success or failure) was recorded.
    pub last_check_at: Option<Instant>,
}

/// Internal mutable record; [`EndpointHealth`] is its public snapshot.
#[derive(Debug, Clone)]
struct HealthRecord {
    healthy: bool,
    success_credit: u32,
    failure_credit: u32,
    smoothed_response_ms: Option<f64>,
    last_check_at: Option<Instant>,
    /// Set when the record flips unhealthy; cleared on any recovery.
    /// Further failures while unhealthy do not move it.
    unhealthy_since: Option<Instant>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            healthy: true,
            success_credit: 0,
            failure_credit: 0,
            smoothed_response_ms: None,
            last_check_at: None,
            unhealthy_since: None,
        }
    }
}

impl HealthRecord {
    fn snapshot(&self) -> EndpointHealth {
        EndpointHealth {
            healthy: self.healthy,
            success_credit: self.success_credit,
            failure_credit: self.failure_credit,
            smoothed_response_ms: self.smoothed_response_ms,
            last_check_at: self.last_check_at,
        }
    }
}

/// Tracks the health of every configured relay endpoint.
///
/// Endpoint identity is the base-URL string. Records are created for the
/// full endpoint set up front and live for the tracker's lifetime; nothing
/// is persisted, so every new tracker starts default-healthy.
#[derive(Debug)]
pub struct EndpointHealthTracker {
    config: HealthConfig,
    clock: Arc<dyn Clock>,
    endpoints: HashMap<String, HealthRecord>,
}

impl EndpointHealthTracker {
    /// Create a tracker for the given endpoints with default thresholds
    /// and the system clock.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(endpoints, HealthConfig::default())
    }

    /// Create a tracker with custom transition thresholds.
    pub fn with_config<I, S>(endpoints: I, config: HealthConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_clock(endpoints, config, Arc::new(SystemClock))
    }

    /// Create a tracker with custom thresholds and an injected time source.
    pub fn with_clock<I, S>(endpoints: I, config: HealthConfig, clock: Arc<dyn Clock>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            config,
            clock,
            endpoints: endpoints
                .into_iter()
                .map(|e| (e.into(), HealthRecord::default()))
                .collect(),
        }
    }

    /// Record a successful attempt with its observed response time.
    ///
    /// Increments success credit, decrements failure credit (floored at 0),
    /// and folds the sample into the smoothed response time. Reaching the
    /// recovery threshold marks the endpoint healthy.
    pub fn record_success(&mut self, endpoint: &str, response_ms: f64) {
        let now = self.clock.now();
        let record = self.endpoints.entry(endpoint.to_owned()).or_default();
        apply_grace_recovery(endpoint, record, now, &self.config);

        record.success_credit += 1;
        record.failure_credit = record.failure_credit.saturating_sub(1);
        record.smoothed_response_ms = Some(match record.smoothed_response_ms {
            Some(prev) => prev * (1.0 - EMA_NEW_SAMPLE_WEIGHT) + response_ms * EMA_NEW_SAMPLE_WEIGHT,
            None => response_ms,
        });

        if record.success_credit >= self.config.recovery_threshold && !record.healthy {
            record.healthy = true;
            record.unhealthy_since = None;
            info!(
                endpoint,
                success_credit = record.success_credit,
                "endpoint recovered"
            );
        }
        record.last_check_at = Some(now);
    }

    /// Record a failed attempt.
    ///
    /// Increments failure credit, decrements success credit (floored at 0).
    /// Reaching the unhealthy threshold marks the endpoint unhealthy and
    /// starts the recovery grace period; further failures while unhealthy
    /// do not restart it.
    pub fn record_failure(&mut self, endpoint: &str) {
        let now = self.clock.now();
        let record = self.endpoints.entry(endpoint.to_owned()).or_default();
        apply_grace_recovery(endpoint, record, now, &self.config);

        record.failure_credit += 1;
        record.success_credit = record.success_credit.saturating_sub(1);

        if record.failure_credit >= self.config.unhealthy_threshold && record.healthy {
            record.healthy = false;
            record.unhealthy_since = Some(now);
            warn!(
                endpoint,
                failure_credit = record.failure_credit,
                "endpoint marked unhealthy"
            );
        }
        record.last_check_at = Some(now);
    }

    /// Whether the endpoint is currently healthy.
    ///
    /// Endpoints the tracker has never seen report healthy, matching the
    /// default record state.
    pub fn is_healthy(&mut self, endpoint: &str) -> bool {
        let now = self.clock.now();
        match self.endpoints.get_mut(endpoint) {
            Some(record) => {
                apply_grace_recovery(endpoint, record, now, &self.config);
                record.healthy
            }
            None => true,
        }
    }

    /// Snapshot of one endpoint's health record.
    pub fn health(&mut self, endpoint: &str) -> Option<EndpointHealth> {
        let now = self.clock.now();
        let record = self.endpoints.get_mut(endpoint)?;
        apply_grace_recovery(endpoint, record, now, &self.config);
        Some(record.snapshot())
    }

    /// Snapshot of every tracked endpoint, for telemetry consumers.
    pub fn health_report(&mut self) -> Vec<(String, EndpointHealth)> {
        let now = self.clock.now();
        let config = self.config.clone();
        self.endpoints
            .iter_mut()
            .map(|(endpoint, record)| {
                apply_grace_recovery(endpoint, record, now, &config);
                (endpoint.clone(), record.snapshot())
            })
            .collect()
    }

    /// Reset every endpoint to the default-healthy state, keeping the
    /// endpoint set intact.
    pub fn reset(&mut self) {
        for record in self.endpoints.values_mut() {
            *record = HealthRecord::default();
        }
    }
}

/// Lazily apply grace-period recovery before reading or updating a record.
///
/// Resets the healthy flag and failure credit once the grace period has
/// elapsed since the record went unhealthy. Success credit is untouched.
fn apply_grace_recovery(
    endpoint: &str,
    record: &mut HealthRecord,
    now: Instant,
    config: &HealthConfig,
) {
    if record.healthy {
        return;
    }
    let Some(since) = record.unhealthy_since else {
        return;
    };
    if now.duration_since(since) >= config.recovery_grace {
        record.healthy = true;
        record.failure_credit = 0;
        record.unhealthy_since = None;
        info!(endpoint, "grace period elapsed, endpoint reset to healthy");
    }
}
