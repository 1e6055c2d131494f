//! Search query generator agent.
//!
//! Turns a user query (plus, on later rounds, the previous queries and the
//! evaluator's feedback) into a short list of search-engine queries.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;

use super::config::AgentConfig;
use super::prompt::build_generator_prompt;
use super::provider::LlmProvider;
use super::traits::{Agent, strip_code_fences};
use crate::core::{Query, RefinementRound, SearchQuery};

/// Maximum queries kept from one generation.
pub const MAX_QUERIES_PER_ROUND: usize = 5;

/// Reason used when a prior round has no recorded feedback.
const DEFAULT_FEEDBACK: &str = "the gathered evidence was insufficient";

/// Accepted response shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum QueryList {
    Bare(Vec<String>),
    Wrapped { queries: Vec<String> },
}

/// Agent that writes search-engine queries.
pub struct GeneratorAgent {
    model: String,
    max_tokens: u32,
    temperature: f32,
    attempts: u32,
    system_prompt: String,
}

impl GeneratorAgent {
    /// Creates a new generator with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            attempts: config.query_generation_attempts.max(1),
            system_prompt,
        }
    }

    /// Generates search queries for the next round.
    ///
    /// Makes up to `query_generation_attempts` provider calls. Queries
    /// issued in earlier rounds are dropped when fresh ones remain. If every
    /// attempt fails, the raw user query is returned as the sole query.
    pub async fn generate(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
        prior_rounds: &[RefinementRound],
    ) -> Vec<SearchQuery> {
        let previous = prior_rounds.last().map(|round| {
            (
                round.queries.as_slice(),
                round.verdict.reason().unwrap_or(DEFAULT_FEEDBACK),
            )
        });
        let user_msg = build_generator_prompt(query.text(), previous);

        let issued: HashSet<String> = prior_rounds
            .iter()
            .flat_map(|r| r.queries.iter())
            .map(|q| q.as_str().to_lowercase())
            .collect();

        for attempt in 1..=self.attempts {
            match self.execute(provider, &user_msg).await {
                Ok(response) => {
                    if let Some(queries) = Self::parse_queries(&response.content) {
                        let selected = Self::select_fresh(queries, &issued);
                        tracing::debug!(attempt, count = selected.len(), "generated search queries");
                        return selected;
                    }
                    tracing::warn!(attempt, "query generator returned a malformed response");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "query generation failed");
                    if !e.is_retryable() {
                        break;
                    }
                }
            }
        }

        tracing::warn!(
            attempts = self.attempts,
            "query generation exhausted, searching for the raw query"
        );
        vec![SearchQuery::new(query.text())]
    }

    /// Parses a JSON array of queries (optionally fenced or wrapped in
    /// `{"queries": [...]}`). Returns `None` unless at least one non-blank
    /// query is present.
    fn parse_queries(content: &str) -> Option<Vec<String>> {
        let json_str = strip_code_fences(content);

        let parsed = serde_json::from_str::<QueryList>(json_str).ok().or_else(|| {
            // Tolerate prose around the array.
            let start = json_str.find('[')?;
            let end = json_str.rfind(']')?;
            serde_json::from_str::<QueryList>(json_str.get(start..=end)?).ok()
        })?;

        let raw = match parsed {
            QueryList::Bare(queries) | QueryList::Wrapped { queries } => queries,
        };

        let mut seen = HashSet::new();
        let queries: Vec<String> = raw
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.to_lowercase()))
            .collect();

        (!queries.is_empty()).then_some(queries)
    }

    /// Drops already-issued queries when fresh ones remain, then caps the list.
    fn select_fresh(queries: Vec<String>, issued: &HashSet<String>) -> Vec<SearchQuery> {
        let fresh: Vec<String> = queries
            .iter()
            .filter(|q| !issued.contains(&q.to_lowercase()))
            .cloned()
            .collect();

        let chosen = if fresh.is_empty() { queries } else { fresh };

        chosen
            .into_iter()
            .take(MAX_QUERIES_PER_ROUND)
            .map(SearchQuery::new)
            .collect()
    }
}

#[async_trait]
impl Agent for GeneratorAgent {
    fn name(&self) -> &'static str {
        "generator"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
