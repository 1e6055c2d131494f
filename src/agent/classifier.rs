//! Query classifier agent.
//!
//! Routes each query to [`QueryType::Math`], [`QueryType::Text`] or
//! [`QueryType::Search`]. Classification never fails: a pure arithmetic
//! expression is recognised locally, and any provider problem resolves to
//! [`QueryType::Search`].

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_classifier_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::arithmetic::extract_expression;
use crate::core::{Query, QueryType};

/// Labels that explicitly request the search route.
const SEARCH_LABELS: &[&str] = &["realtime", "search", "web", "current", "online"];

/// Agent that decides how a query is answered.
pub struct ClassifierAgent {
    model: String,
    system_prompt: String,
    direct_answers: bool,
}

impl ClassifierAgent {
    /// Creates a new classifier with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt,
            direct_answers: config.direct_answers,
        }
    }

    /// Classifies a query.
    ///
    /// Makes at most one provider call. When direct answers are disabled,
    /// [`QueryType::Text`] is upgraded to [`QueryType::Search`].
    pub async fn classify(&self, provider: &dyn LlmProvider, query: &Query) -> QueryType {
        if extract_expression(query.text()).is_some() {
            tracing::debug!(query_type = "math", "classified by expression heuristic");
            return QueryType::Math;
        }

        let query_type = match self
            .execute(provider, &build_classifier_prompt(query.text()))
            .await
        {
            Ok(response) => Self::parse_label(&response.content),
            Err(e) => {
                tracing::warn!(error = %e, "classifier unavailable, defaulting to search");
                QueryType::Search
            }
        };

        if query_type == QueryType::Text && !self.direct_answers {
            return QueryType::Search;
        }
        query_type
    }

    /// Maps a model reply onto a route using its first recognised label.
    fn parse_label(content: &str) -> QueryType {
        content
            .split_whitespace()
            .find_map(|word| {
                let query_type = QueryType::from_label(word);
                let normalized = word
                    .trim_matches(|c: char| !c.is_ascii_alphanumeric())
                    .to_ascii_lowercase();
                if query_type != QueryType::Search || SEARCH_LABELS.contains(&normalized.as_str())
                {
                    Some(query_type)
                } else {
                    None
                }
            })
            .unwrap_or(QueryType::Search)
    }
}

#[async_trait]
impl Agent for ClassifierAgent {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.0
    }

    fn max_tokens(&self) -> u32 {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("math", QueryType::Math)]
    #[test_case("simple", QueryType::Text)]
    #[test_case("realtime", QueryType::Search)]
    #[test_case("Category: simple.", QueryType::Text)]
    #[test_case("realtime, not simple", QueryType::Search)]
    #[test_case("I think MATH", QueryType::Math)]
    #[test_case("no idea at all", QueryType::Search)]
    #[test_case("", QueryType::Search)]
    fn test_parse_label(content: &str, expected: QueryType) {
        assert_eq!(ClassifierAgent::parse_label(content), expected);
    }

    #[test]
    fn test_agent_properties() {
        let config = AgentConfig::builder()
            .api_key("test")
            .model("small-model")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let agent = ClassifierAgent::new(&config, "prompt".to_string());
        assert_eq!(agent.name(), "classifier");
        assert_eq!(agent.model(), "small-model");
        assert!(!agent.json_mode());
    }
}
