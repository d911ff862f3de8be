//! Shared HTTP client for relay worker requests.
//!
//! Requests are plain GETs carrying an `Accept: application/json` header and
//! deliberately no `Content-Type`: the original browser deployment keeps
//! every request CORS-simple so worker mirrors never see a pre-flight, and
//! the same wire shape is preserved here.

use crate::config::PortalConfig;
use crate::error::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;

/// Build a [`reqwest::Client`] configured for relay worker requests.
///
/// The client has:
/// - `Accept: application/json` as a default header (and nothing else)
/// - Per-attempt timeout from config, covering connect through body read
/// - Gzip and brotli decompression
/// - Bounded redirect following
///
/// # Errors
///
/// Returns [`FetchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &PortalConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| FetchError::Http(format!("failed to build HTTP client: {e}")))
}
