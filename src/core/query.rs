//! User queries and their routing type.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// An immutable user query.
///
/// Carries the raw text plus two optional caller hints: whether the query
/// should be treated as complex (multi-candidate synthesis) and a retry
/// budget that overrides the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    complex: Option<bool>,
    max_retries: Option<u32>,
}

impl Query {
    /// Creates a query from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidQuery`] if the text is blank or
    /// longer than [`MAX_QUERY_LEN`] bytes.
    pub fn new(text: impl Into<String>) -> Result<Self, WorkflowError> {
        let text = text.into().trim().to_string();

        if text.is_empty() {
            return Err(WorkflowError::InvalidQuery {
                message: "Query not provided".to_string(),
            });
        }

        if text.len() > MAX_QUERY_LEN {
            return Err(WorkflowError::InvalidQuery {
                message: format!(
                    "Query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                    text.len()
                ),
            });
        }

        Ok(Self {
            text,
            complex: None,
            max_retries: None,
        })
    }

    /// Sets the caller-supplied retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidRetryBudget`] for negative values.
    pub fn with_max_retries(mut self, max_retries: i64) -> Result<Self, WorkflowError> {
        let budget = u32::try_from(max_retries)
            .map_err(|_| WorkflowError::InvalidRetryBudget { value: max_retries })?;
        self.max_retries = Some(budget);
        Ok(self)
    }

    /// Marks the query as complex (or explicitly simple).
    #[must_use]
    pub const fn with_complex(mut self, complex: bool) -> Self {
        self.complex = Some(complex);
        self
    }

    /// Raw query text (trimmed).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Caller complexity hint, if any.
    #[must_use]
    pub const fn complex(&self) -> Option<bool> {
        self.complex
    }

    /// Caller-supplied retry budget, if any.
    #[must_use]
    pub const fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Effective retry budget: the caller value when present, else `default`.
    #[must_use]
    pub fn effective_retries(&self, default: u32) -> u32 {
        self.max_retries.unwrap_or(default)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Route chosen for a query. Decided once, before any evidence is gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Arithmetic evaluation.
    Math,
    /// Direct answer from model knowledge.
    Text,
    /// Web-search-grounded answer.
    Search,
}

impl QueryType {
    /// Maps a classifier label onto a route.
    ///
    /// Total: unknown labels fall back to [`QueryType::Search`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_ascii_lowercase();

        match normalized.as_str() {
            "math" | "mathematics" | "calculation" | "arithmetic" => Self::Math,
            "simple" | "text" | "direct" | "general" => Self::Text,
            _ => Self::Search,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Text => "text",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_query_trims_text() {
        let query = Query::new("  capital of France?  ").unwrap_or_else(|_| unreachable!());
        assert_eq!(query.text(), "capital of France?");
        assert!(query.max_retries().is_none());
        assert!(query.complex().is_none());
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(
            Query::new("   "),
            Err(WorkflowError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_oversized_query_rejected() {
        let text = "a".repeat(MAX_QUERY_LEN + 1);
        assert!(Query::new(text).is_err());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let query = Query::new("q").unwrap_or_else(|_| unreachable!());
        let result = query.with_max_retries(-1);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidRetryBudget { value: -1 })
        ));
    }

    #[test]
    fn test_effective_retries() {
        let query = Query::new("q").unwrap_or_else(|_| unreachable!());
        assert_eq!(query.effective_retries(3), 3);
        let query = query.with_max_retries(0).unwrap_or_else(|_| unreachable!());
        assert_eq!(query.effective_retries(3), 0);
    }

    #[test_case("math", QueryType::Math)]
    #[test_case("Math.", QueryType::Math)]
    #[test_case("simple", QueryType::Text)]
    #[test_case("\"text\"", QueryType::Text)]
    #[test_case("realtime", QueryType::Search)]
    #[test_case("search", QueryType::Search)]
    #[test_case("no idea", QueryType::Search)]
    #[test_case("", QueryType::Search)]
    fn test_label_mapping(label: &str, expected: QueryType) {
        assert_eq!(QueryType::from_label(label), expected);
    }

    #[test]
    fn test_query_type_serialization() {
        let json = serde_json::to_string(&QueryType::Search).unwrap_or_default();
        assert_eq!(json, "\"search\"");
    }
}
