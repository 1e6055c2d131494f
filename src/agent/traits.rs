//! The [`Agent`] seam: one system prompt, one model, one completion per call.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse, TokenUsage, system_message, user_message};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Raw output of one agent call, before the agent parses it.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Completion text as returned by the provider.
    pub content: String,
    /// Token accounting for this call.
    pub usage: TokenUsage,
    /// `"length"` when the completion hit `max_tokens`.
    pub finish_reason: Option<String>,
}

/// A workflow step backed by a single prompt.
///
/// Implementors supply the prompt and sampling settings; the provided
/// methods turn a rendered user prompt into a [`ChatRequest`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Short name used in log fields and error messages.
    fn name(&self) -> &'static str;

    /// Model the request is sent to.
    fn model(&self) -> &str;

    /// Instructions sent as the system turn.
    fn system_prompt(&self) -> &str;

    /// Requests a JSON object reply. Only the evaluator turns this on; the
    /// generator parses its array leniently instead.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature for [`Agent::execute`].
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Completion token cap.
    fn max_tokens(&self) -> u32 {
        1024
    }

    /// Runs the agent at its own temperature.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`AgentError`].
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, AgentError> {
        self.execute_at(provider, user_msg, self.temperature()).await
    }

    /// Runs the agent at `temperature`, used for candidate fan-out.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`AgentError`].
    async fn execute_at(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        temperature: f32,
    ) -> Result<AgentResponse, AgentError> {
        let request = ChatRequest {
            model: self.model().to_string(),
            messages: vec![system_message(self.system_prompt()), user_message(user_msg)],
            temperature: Some(temperature),
            max_tokens: Some(self.max_tokens()),
            json_mode: self.json_mode(),
        };

        let response: ChatResponse = provider.chat(&request).await?;

        Ok(AgentResponse {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}

/// Removes a markdown fence models like to wrap JSON replies in.
#[must_use]
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();

    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```JSON")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[\"a\"]\n```"), "[\"a\"]");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }
}
