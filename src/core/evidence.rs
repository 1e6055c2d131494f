//! Search queries, results, evidence, and refinement-round records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker appended to text cut by [`truncate_text`].
pub const TRUNCATION_MARKER: &str = "...";

/// A generated search-engine query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Creates a search query from text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single result returned by a search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result URL.
    pub url: String,
    /// Result title.
    pub title: String,
    /// Snippet shown by the engine.
    pub snippet: String,
}

/// Extracted page text associated with a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Source URL.
    pub url: String,
    /// Page or result title.
    pub title: String,
    /// Extracted text, truncated to the configured maximum content length.
    pub text: String,
    /// When the text was retrieved.
    pub retrieved_at: DateTime<Utc>,
}

impl Evidence {
    /// Creates evidence stamped with the current time, truncating `text`
    /// to `max_content_length` characters.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        text: &str,
        max_content_length: usize,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: truncate_text(text, max_content_length),
            retrieved_at: Utc::now(),
        }
    }
}

/// Evaluator judgement on the gathered evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The evidence answers the query.
    Sufficient,
    /// Another round is needed; `reason` seeds the next generation prompt.
    Insufficient {
        /// Why the evidence falls short.
        reason: String,
    },
    /// The evaluator could not reach the provider and no budget remains.
    Unavailable {
        /// Provider failure description.
        reason: String,
    },
}

impl Verdict {
    /// Returns `true` for [`Verdict::Sufficient`].
    #[must_use]
    pub const fn is_sufficient(&self) -> bool {
        matches!(self, Self::Sufficient)
    }

    /// Reason attached to a non-sufficient verdict.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Sufficient => None,
            Self::Insufficient { reason } | Self::Unavailable { reason } => Some(reason),
        }
    }
}

/// One generate → search → evaluate iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementRound {
    /// 0-based round index.
    pub index: u32,
    /// Queries issued this round.
    pub queries: Vec<SearchQuery>,
    /// Evidence gathered this round.
    pub evidence: Vec<Evidence>,
    /// Number of evidence entries whose URL had not been seen before.
    pub new_evidence: usize,
    /// Evaluator verdict.
    pub verdict: Verdict,
}

/// Truncates `text` to `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
        None => text.to_string(),
    }
}

/// Returns the evidence with duplicate URLs removed, keeping the first
/// occurrence of each.
#[must_use]
pub fn dedup_by_url(evidence: &[Evidence]) -> Vec<Evidence> {
    let mut seen = std::collections::HashSet::new();
    evidence
        .iter()
        .filter(|e| seen.insert(e.url.as_str()))
        .cloned()
        .collect()
}
