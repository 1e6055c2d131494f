//! Request and response bodies for the HTTP interface.

use serde::{Deserialize, Serialize};

pub use crate::core::Answer as AskResponse;

/// Body of `POST /ask`.
///
/// `query` is optional at the wire level so a missing field yields a
/// descriptive 400 rather than a generic deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer.
    #[serde(default)]
    pub query: Option<String>,

    /// Retry budget for the refinement loop (must be non-negative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,

    /// Marks the query as complex (several candidates) or simple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex: Option<bool>,
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_optional_fields() {
        let req: AskRequest =
            serde_json::from_str(r#"{"query": "hi"}"#).unwrap_or_default();
        assert_eq!(req.query.as_deref(), Some("hi"));
        assert!(req.max_retries.is_none());
        assert!(req.complex.is_none());

        let req: AskRequest = serde_json::from_str("{}").unwrap_or_default();
        assert!(req.query.is_none());
    }

    #[test]
    fn test_negative_retries_deserialize() {
        let req: AskRequest =
            serde_json::from_str(r#"{"query": "q", "max_retries": -1}"#).unwrap_or_default();
        assert_eq!(req.max_retries, Some(-1));
    }
}
