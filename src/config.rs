//! Portal configuration with sensible defaults.
//!
//! [`PortalConfig`] names the endpoint set (one primary, N ordered fallback
//! mirrors) and the retry, timeout, and caching behaviour of the fetch
//! pipeline. It deserializes from the portal's settings file with per-field
//! defaults, so a config naming only `primary_endpoint` is valid.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the orchestrator walks the endpoint list within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStrategy {
    /// Try endpoints one at a time in priority order; the first success
    /// short-circuits the rest of the sweep. The default.
    #[default]
    Sequential,
    /// Fan the whole sweep out concurrently and take the first success.
    /// Lower latency when mirrors are slow, at the cost of duplicate load
    /// on every worker per request.
    Race,
}

/// Configuration for the relay fetch pipeline.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Base URL of the primary relay worker. Always tried first.
    pub primary_endpoint: String,
    /// Base URLs of fallback mirrors, tried in listed order after the
    /// primary. Order is priority; it is never reordered at runtime.
    pub fallback_endpoints: Vec<String>,
    /// How many times a fully failed endpoint sweep is retried.
    pub max_retries: u32,
    /// Per-attempt HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Base backoff delay in milliseconds. The wait before retry N
    /// (1-indexed) is `backoff_base_ms * N`.
    pub backoff_base_ms: u64,
    /// Endpoint sweep strategy within one cycle.
    pub strategy: SweepStrategy,
    /// Whether built requests carry the worker's safe-search flag.
    pub safe_search: bool,
    /// How long successful payloads are cached in seconds. Set to 0 to
    /// disable caching.
    pub cache_ttl_seconds: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            primary_endpoint: "https://worker.searchportal.dev".into(),
            fallback_endpoints: vec![
                "https://worker-2.searchportal.dev".into(),
                "https://worker-3.searchportal.dev".into(),
            ],
            max_retries: 3,
            request_timeout_ms: 15_000,
            backoff_base_ms: 1_000,
            strategy: SweepStrategy::Sequential,
            safe_search: true,
            cache_ttl_seconds: 600,
        }
    }
}

impl PortalConfig {
    /// The full endpoint sweep order: primary first, then fallbacks as
    /// listed.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::with_capacity(1 + self.fallback_endpoints.len());
        endpoints.push(self.primary_endpoint.clone());
        endpoints.extend(self.fallback_endpoints.iter().cloned());
        endpoints
    }

    /// Validates this configuration, returning an error if any field is
    /// invalid.
    ///
    /// Checks:
    /// - `primary_endpoint` must be a parseable absolute URL
    /// - every fallback endpoint must be a parseable absolute URL
    /// - `request_timeout_ms` must be greater than 0
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.primary_endpoint.trim().is_empty() {
            return Err(FetchError::Config("primary_endpoint must be set".into()));
        }
        Url::parse(&self.primary_endpoint).map_err(|e| {
            FetchError::Config(format!(
                "primary_endpoint `{}` is not a valid URL: {e}",
                self.primary_endpoint
            ))
        })?;
        for endpoint in &self.fallback_endpoints {
            Url::parse(endpoint).map_err(|e| {
                FetchError::Config(format!(
                    "fallback endpoint `{endpoint}` is not a valid URL: {e}"
                ))
            })?;
        }
        if self.request_timeout_ms == 0 {
            return Err(FetchError::Config(
                "request_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = PortalConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout_ms, 15_000);
        assert_eq!(config.backoff_base_ms, 1_000);
        assert_eq!(config.strategy, SweepStrategy::Sequential);
        assert!(config.safe_search);
        assert_eq!(config.cache_ttl_seconds, 600);
        assert_eq!(config.fallback_endpoints.len(), 2);
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(PortalConfig::default().validate().is_ok());
    }

    #[test]
    fn endpoints_lists_primary_first() {
        let config = PortalConfig {
            primary_endpoint: "https://a.example".into(),
            fallback_endpoints: vec!["https://b.example".into(), "https://c.example".into()],
            ..Default::default()
        };
        assert_eq!(
            config.endpoints(),
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[test]
    fn endpoints_without_fallbacks() {
        let config = PortalConfig {
            primary_endpoint: "https://a.example".into(),
            fallback_endpoints: vec![],
            ..Default::default()
        };
        assert_eq!(config.endpoints(), vec!["https://a.example"]);
    }

    #[test]
    fn empty_primary_rejected() {
        let config = PortalConfig {
            primary_endpoint: "  ".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("primary_endpoint"));
    }

    #[test]
    fn malformed_primary_rejected() {
        let config = PortalConfig {
            primary_endpoint: "not a url".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn malformed_fallback_rejected() {
        let config = PortalConfig {
            fallback_endpoints: vec!["https://ok.example".into(), "::garbage::".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = PortalConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn zero_retries_valid() {
        let config = PortalConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let config: PortalConfig =
            serde_json::from_str(r#"{"primary_endpoint": "https://relay.example"}"#)
                .expect("deserialize");
        assert_eq!(config.primary_endpoint, "https://relay.example");
        // Everything else takes the default.
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.strategy, SweepStrategy::Sequential);
    }

    #[test]
    fn strategy_deserializes_snake_case() {
        let config: PortalConfig = serde_json::from_str(
            r#"{"primary_endpoint": "https://relay.example", "strategy": "race"}"#,
        )
        .expect("deserialize");
        assert_eq!(config.strategy, SweepStrategy::Race);
    }

    #[test]
    fn serde_round_trip() {
        let config = PortalConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let decoded: PortalConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.primary_endpoint, config.primary_endpoint);
        assert_eq!(decoded.fallback_endpoints, config.fallback_endpoints);
        assert_eq!(decoded.cache_ttl_seconds, config.cache_ttl_seconds);
    }
}
