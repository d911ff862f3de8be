//! Error types for the relay-search crate.
//!
//! Only terminal outcomes cross the crate boundary. Per-endpoint failures
//! (connect errors, timeouts, non-2xx statuses, malformed payloads) are
//! absorbed inside the orchestrator, recorded as health outcomes, and folded
//! into the aggregate message when every endpoint has failed.

/// Errors surfaced to callers of the fetch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Every configured endpoint failed in every retry cycle.
    #[error("all endpoints failed: {0}")]
    AllEndpointsFailed(String),

    /// The caller cancelled the request.
    ///
    /// Not a failure: no retry is attempted and no health outcome is
    /// recorded for the attempt that was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid portal configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Convenience type alias for relay-search results.
pub type Result<T> = std::result::Result<T, FetchError>;
