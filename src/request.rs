//! Logical search requests and their URL form.
//!
//! A [`SearchRequest`] is the unit the orchestrator executes: a vertical
//! plus ordered query parameters, independent of which relay endpoint ends
//! up serving it. [`SearchRequest::to_url`] binds it to a concrete endpoint
//! base at attempt time.

use crate::error::FetchError;
use crate::types::SearchVertical;
use url::Url;

/// A logical search request.
///
/// Parameter order is preserved as inserted so request URLs are stable for
/// logging and cache keying. The builder methods mirror the parameters the
/// portal front-end sends: `q`, `safe`, `page`, `ai`; arbitrary extras go
/// through [`SearchRequest::param`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    vertical: SearchVertical,
    params: Vec<(String, String)>,
}

impl SearchRequest {
    /// Start a request for the given vertical with no parameters.
    pub fn new(vertical: SearchVertical) -> Self {
        Self {
            vertical,
            params: Vec::new(),
        }
    }

    /// Set the query string (`q`).
    pub fn query(self, q: &str) -> Self {
        self.param("q", q)
    }

    /// Set the safe-search flag (`safe=1` / `safe=0`).
    pub fn safe_search(self, enabled: bool) -> Self {
        self.param("safe", if enabled { "1" } else { "0" })
    }

    /// Set the result page, 1-indexed (`page`).
    pub fn page(self, page: u32) -> Self {
        self.param("page", page.to_string())
    }

    /// Set the AI-summary flag (`ai=1` / `ai=0`).
    pub fn ai_summary(self, enabled: bool) -> Self {
        self.param("ai", if enabled { "1" } else { "0" })
    }

    /// Append an arbitrary query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// The vertical this request targets.
    pub fn vertical(&self) -> SearchVertical {
        self.vertical
    }

    /// The query parameters, in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Build the concrete URL for this request against an endpoint base.
    ///
    /// The vertical path is appended to the base (a trailing slash on the
    /// base is tolerated) and parameters are percent-encoded into the query
    /// string.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if the base is not a parseable URL.
    pub fn to_url(&self, base: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!(
            "{}{}",
            base.trim_end_matches('/'),
            self.vertical.path()
        ))
        .map_err(|e| FetchError::Config(format!("invalid endpoint base `{base}`: {e}")))?;
        if !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}
