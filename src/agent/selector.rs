//! Best-answer selector agent.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::config::AgentConfig;
use super::prompt::build_selection_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{Candidate, Query};

static INDEX_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

/// Agent that picks the best of several candidate answers.
pub struct SelectorAgent {
    model: String,
    system_prompt: String,
}

impl SelectorAgent {
    /// Creates a new selector with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt,
        }
    }

    /// Selects one candidate.
    ///
    /// A single candidate is returned unchanged without a provider call.
    /// An unusable reply or a provider failure selects the first candidate.
    /// Returns `None` only for an empty candidate list.
    pub async fn select(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
        mut candidates: Vec<Candidate>,
    ) -> Option<Candidate> {
        if candidates.len() <= 1 {
            return candidates.pop();
        }

        let user_msg = build_selection_prompt(query.text(), &candidates);
        let index = match self.execute(provider, &user_msg).await {
            Ok(response) => Self::parse_choice(&response.content, candidates.len()),
            Err(e) => {
                tracing::warn!(error = %e, "selector unavailable, keeping first candidate");
                None
            }
        };

        let index = index.unwrap_or_else(|| {
            tracing::warn!(
                candidates = candidates.len(),
                "selector reply unusable, keeping first candidate"
            );
            0
        });
        tracing::debug!(selected = index + 1, of = candidates.len(), "selected answer");
        Some(candidates.swap_remove(index))
    }

    /// Parses the first integer in the reply as a 1-based index.
    fn parse_choice(content: &str, count: usize) -> Option<usize> {
        let number: usize = INDEX_RE.as_ref()?.find(content)?.as_str().parse().ok()?;
        (1..=count).contains(&number).then(|| number - 1)
    }
}

#[async_trait]
impl Agent for SelectorAgent {
    fn name(&self) -> &'static str {
        "selector"
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
