//! Answer synthesizer.
//!
//! Produces candidate answers for the route chosen by the classifier:
//! local arithmetic (with a provider fallback) for math, a direct
//! completion for text, and evidence-grounded completions for search.
//! Complex search queries fan out into several candidates sampled at
//! distinct temperatures.

use async_trait::async_trait;
use futures_util::future::join_all;

use super::config::AgentConfig;
use super::prompt::{PromptSet, build_math_prompt, build_synthesis_prompt, build_text_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::arithmetic::{self, extract_expression};
use crate::core::{Candidate, Evidence, Query, QueryType};
use crate::error::{AgentError, WorkflowError};

/// Temperature step between successive candidates.
const CANDIDATE_TEMPERATURE_STEP: f32 = 0.2;
/// Upper bound on candidate sampling temperature.
const MAX_CANDIDATE_TEMPERATURE: f32 = 2.0;

/// Single-prompt answering agent for one route.
struct RouteAgent {
    name: &'static str,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

#[async_trait]
impl Agent for RouteAgent {
    fn name(&self) -> &'static str {
        self.name
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

impl RouteAgent {
    /// Runs the agent and rejects blank output.
    async fn answer(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        temperature: f32,
    ) -> Result<String, AgentError> {
        let response = self.execute_at(provider, user_msg, temperature).await?;
        if response.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                agent = self.name,
                completion_tokens = response.usage.completion_tokens,
                "answer hit the token limit and may be cut short"
            );
        }
        tracing::debug!(
            agent = self.name,
            total_tokens = response.usage.total_tokens,
            "candidate generated"
        );
        let content = response.content.trim();
        if content.is_empty() {
            return Err(AgentError::EmptyResponse { agent: self.name });
        }
        Ok(content.to_string())
    }
}

/// Agent that turns a routed query (and evidence) into candidate answers.
pub struct SynthesizerAgent {
    search: RouteAgent,
    text: RouteAgent,
    math: RouteAgent,
    candidate_count: usize,
    complex_query_chars: usize,
    max_content_length: usize,
}

impl SynthesizerAgent {
    /// Creates a new synthesizer with the given configuration and prompts.
    #[must_use]
    pub fn new(config: &AgentConfig, prompts: &PromptSet) -> Self {
        let route = |name, system_prompt: &str, temperature| RouteAgent {
            name,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature,
            system_prompt: system_prompt.to_string(),
        };

        Self {
            search: route("synthesizer", &prompts.synthesizer, config.temperature),
            text: route("text", &prompts.text, config.temperature),
            math: route("math", &prompts.math, 0.0),
            candidate_count: config.candidate_count.max(1),
            complex_query_chars: config.complex_query_chars,
            max_content_length: config.max_content_length,
        }
    }

    /// Produces at least one candidate answer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Synthesis`] when every provider call fails.
    pub async fn synthesize(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
        query_type: QueryType,
        evidence: &[Evidence],
    ) -> Result<Vec<Candidate>, WorkflowError> {
        match query_type {
            QueryType::Math => self.synthesize_math(provider, query).await,
            QueryType::Text => {
                let text = self
                    .text
                    .answer(provider, &build_text_prompt(query.text()), self.text.temperature)
                    .await
                    .map_err(|source| WorkflowError::Synthesis { source })?;
                Ok(vec![Candidate::ungrounded(text, QueryType::Text)])
            }
            QueryType::Search => self.synthesize_search(provider, query, evidence).await,
        }
    }

    /// Whether a query gets several candidates.
    ///
    /// An explicit caller flag wins; otherwise long queries and queries
    /// with two or more sub-questions are complex.
    #[must_use]
    pub fn is_complex(&self, query: &Query) -> bool {
        query.complex().unwrap_or_else(|| {
            query.text().chars().count() >= self.complex_query_chars
                || sub_question_count(query.text()) >= 2
        })
    }

    async fn synthesize_math(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
    ) -> Result<Vec<Candidate>, WorkflowError> {
        if let Some(expression) = extract_expression(query.text()) {
            match arithmetic::evaluate(&expression) {
                Ok(value) => {
                    let result = arithmetic::format_number(value);
                    tracing::debug!(%expression, %result, "evaluated locally");
                    return Ok(vec![Candidate::ungrounded(result, QueryType::Math)]);
                }
                Err(e) => {
                    tracing::debug!(%expression, error = %e, "local evaluation failed, asking provider");
                }
            }
        }

        let text = self
            .math
            .answer(provider, &build_math_prompt(query.text()), 0.0)
            .await
            .map_err(|source| WorkflowError::Synthesis { source })?;
        Ok(vec![Candidate::ungrounded(text, QueryType::Math)])
    }

    async fn synthesize_search(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
        evidence: &[Evidence],
    ) -> Result<Vec<Candidate>, WorkflowError> {
        let count = if self.is_complex(query) {
            self.candidate_count
        } else {
            1
        };
        let user_msg = build_synthesis_prompt(query.text(), evidence, self.max_content_length);
        let temperatures = candidate_temperatures(self.search.temperature, count);

        let results = join_all(
            temperatures
                .iter()
                .map(|&t| self.search.answer(provider, &user_msg, t)),
        )
        .await;

        let mut candidates = Vec::with_capacity(results.len());
        let mut last_error = None;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(text) => candidates.push(Candidate {
                    text,
                    query_type: QueryType::Search,
                    evidence: evidence.to_vec(),
                }),
                Err(e) => {
                    tracing::warn!(candidate = i, error = %e, "candidate synthesis failed");
                    last_error = Some(e);
                }
            }
        }

        if candidates.is_empty() {
            return Err(WorkflowError::Synthesis {
                source: last_error.unwrap_or(AgentError::EmptyResponse {
                    agent: "synthesizer",
                }),
            });
        }
        Ok(candidates)
    }
}

/// Sampling temperatures for `count` candidates, starting at `base`.
fn candidate_temperatures(base: f32, count: usize) -> Vec<f32> {
    let start = base.min(MAX_CANDIDATE_TEMPERATURE - CANDIDATE_TEMPERATURE_STEP);
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let offset = CANDIDATE_TEMPERATURE_STEP * i as f32;
            (start + offset).min(MAX_CANDIDATE_TEMPERATURE)
        })
        .collect()
}

/// Counts the sub-questions in a query: `?` marks, `;`-separated clauses,
/// or clauses joined by "and also".
fn sub_question_count(text: &str) -> usize {
    let questions = text.matches('?').count();
    let clauses = text.split(';').filter(|c| !c.trim().is_empty()).count()
        + text.to_lowercase().matches(" and also ").count();
    questions.max(clauses)
}
