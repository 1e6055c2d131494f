//! Evidence evaluator agent.
//!
//! Judges whether the evidence gathered so far answers the query.

use async_trait::async_trait;
use serde::Deserialize;

use super::config::AgentConfig;
use super::prompt::build_evaluation_prompt;
use super::provider::LlmProvider;
use super::traits::{Agent, strip_code_fences};
use crate::core::{Evidence, Query, Verdict};

/// Reason reported when no evidence has been gathered.
const NO_EVIDENCE_REASON: &str = "no search results were retrieved";
/// Reason reported for an unparseable evaluator reply.
const UNPARSEABLE_REASON: &str = "the evaluation could not be interpreted";

#[derive(Deserialize)]
struct EvaluationReply {
    #[serde(alias = "satisfactory", alias = "is_sufficient")]
    sufficient: bool,
    #[serde(default)]
    reason: String,
}

/// Agent that judges evidence sufficiency.
pub struct EvaluatorAgent {
    model: String,
    system_prompt: String,
    max_content_length: usize,
}

impl EvaluatorAgent {
    /// Creates a new evaluator with the given configuration and system prompt.
    ///
    /// The caller picks the tolerant or strict prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt,
            max_content_length: config.max_content_length,
        }
    }

    /// Evaluates the evidence for a query.
    ///
    /// Empty evidence is insufficient without a provider call. A provider
    /// failure yields [`Verdict::Insufficient`] while budget remains and
    /// [`Verdict::Unavailable`] otherwise.
    pub async fn evaluate(
        &self,
        provider: &dyn LlmProvider,
        query: &Query,
        evidence: &[Evidence],
        budget_remaining: bool,
    ) -> Verdict {
        if evidence.is_empty() {
            return Verdict::Insufficient {
                reason: NO_EVIDENCE_REASON.to_string(),
            };
        }

        let user_msg = build_evaluation_prompt(query.text(), evidence, self.max_content_length);
        match self.execute(provider, &user_msg).await {
            Ok(response) => Self::parse_verdict(&response.content),
            Err(e) => {
                tracing::warn!(error = %e, budget_remaining, "evaluator unavailable");
                let reason = format!("evaluation failed: {e}");
                if budget_remaining {
                    Verdict::Insufficient { reason }
                } else {
                    Verdict::Unavailable { reason }
                }
            }
        }
    }

    /// Parses the evaluator's JSON reply.
    fn parse_verdict(content: &str) -> Verdict {
        let json_str = strip_code_fences(content);

        let reply = serde_json::from_str::<EvaluationReply>(json_str)
            .ok()
            .or_else(|| {
                let start = json_str.find('{')?;
                let end = json_str.rfind('}')?;
                serde_json::from_str::<EvaluationReply>(json_str.get(start..=end)?).ok()
            });

        match reply {
            Some(EvaluationReply {
                sufficient: true, ..
            }) => Verdict::Sufficient,
            Some(EvaluationReply {
                sufficient: false,
                reason,
            }) => Verdict::Insufficient {
                reason: if reason.trim().is_empty() {
                    "the evidence does not answer the query".to_string()
                } else {
                    reason.trim().to_string()
                },
            },
            None => {
                tracing::warn!("evaluator returned an unparseable response");
                Verdict::Insufficient {
                    reason: UNPARSEABLE_REASON.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl Agent for EvaluatorAgent {
    fn name(&self) -> &'static str {
        "evaluator"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        0.0
    }

    fn max_tokens(&self) -> u32 {
        256
    }
}
