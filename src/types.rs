//! Core types: logical search verticals and the relay response payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Logical endpoints exposed by every relay worker.
///
/// The portal front-end maps each result tab to one of these paths; every
/// worker mirror serves the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchVertical {
    /// Standard web results.
    Web,
    /// Image results.
    Images,
    /// Video results.
    Videos,
    /// News results.
    News,
    /// Combined results across verticals.
    All,
    /// Query completion suggestions for the search box.
    Suggest,
}

impl SearchVertical {
    /// Returns the worker path this vertical maps to.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Web => "/search",
            Self::Images => "/images",
            Self::Videos => "/videos",
            Self::News => "/news",
            Self::All => "/all",
            Self::Suggest => "/suggest",
        }
    }

    /// Returns the human-readable name of this vertical.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::News => "news",
            Self::All => "all",
            Self::Suggest => "suggest",
        }
    }

    /// Returns all available vertical variants.
    pub fn all() -> &'static [SearchVertical] {
        &[
            Self::Web,
            Self::Images,
            Self::Videos,
            Self::News,
            Self::All,
            Self::Suggest,
        ]
    }
}

impl fmt::Display for SearchVertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed payload returned by a relay worker.
///
/// Workers return a JSON object whose exact shape varies by vertical; a
/// `results` array is expected but not enforced, so callers inspect
/// [`SearchResponse::results`] themselves. The orchestrator only counts an
/// attempt as successful when the object is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResponse(Map<String, Value>);

impl SearchResponse {
    /// Wrap a parsed JSON value. Returns `None` unless the value is an
    /// object; arrays, scalars, and `null` are not valid worker payloads.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// `true` when the payload object has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level fields in the payload.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The `results` field, if the worker returned one.
    pub fn results(&self) -> Option<&Value> {
        self.0.get("results")
    }

    /// Look up an arbitrary top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Consume the wrapper, returning the underlying JSON object.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vertical_paths() {
        assert_eq!(SearchVertical::Web.path(), "/search");
        assert_eq!(SearchVertical::Images.path(), "/images");
        assert_eq!(SearchVertical::Videos.path(), "/videos");
        assert_eq!(SearchVertical::News.path(), "/news");
        assert_eq!(SearchVertical::All.path(), "/all");
        assert_eq!(SearchVertical::Suggest.path(), "/suggest");
    }

    #[test]
    fn vertical_display() {
        assert_eq!(SearchVertical::Web.to_string(), "web");
        assert_eq!(SearchVertical::Suggest.to_string(), "suggest");
    }

    #[test]
    fn vertical_all_lists_every_variant() {
        let all = SearchVertical::all();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&SearchVertical::Web));
        assert!(all.contains(&SearchVertical::Suggest));
    }

    #[test]
    fn vertical_serde_round_trip() {
        let json = serde_json::to_string(&SearchVertical::Images).expect("serialize");
        assert_eq!(json, "\"images\"");
        let decoded: SearchVertical = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, SearchVertical::Images);
    }

    #[test]
    fn vertical_equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(SearchVertical::Web);
        set.insert(SearchVertical::Web);
        assert_eq!(set.len(), 1);
        set.insert(SearchVertical::News);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn response_from_object() {
        let response =
            SearchResponse::from_value(json!({"results": ["ok"]})).expect("object payload");
        assert!(!response.is_empty());
        assert_eq!(response.len(), 1);
        assert_eq!(response.results(), Some(&json!(["ok"])));
    }

    #[test]
    fn response_rejects_non_objects() {
        assert!(SearchResponse::from_value(json!(["ok"])).is_none());
        assert!(SearchResponse::from_value(json!("ok")).is_none());
        assert!(SearchResponse::from_value(json!(42)).is_none());
        assert!(SearchResponse::from_value(Value::Null).is_none());
    }

    #[test]
    fn empty_object_is_empty() {
        let response = SearchResponse::from_value(json!({})).expect("object payload");
        assert!(response.is_empty());
        assert!(response.results().is_none());
    }

    #[test]
    fn response_field_access() {
        let response = SearchResponse::from_value(json!({
            "results": [],
            "page": 2,
        }))
        .expect("object payload");
        assert_eq!(response.get("page"), Some(&json!(2)));
        assert!(response.get("missing").is_none());
    }

    #[test]
    fn response_serde_round_trip() {
        let response = SearchResponse::from_value(json!({"results": ["a", "b"], "total": 2}))
            .expect("object payload");
        let json = serde_json::to_string(&response).expect("serialize");
        let decoded: SearchResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, response);
    }

    #[test]
    fn response_into_inner() {
        let response = SearchResponse::from_value(json!({"results": []})).expect("object payload");
        let map = response.into_inner();
        assert!(map.contains_key("results"));
    }
}
