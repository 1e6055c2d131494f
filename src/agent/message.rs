//! Chat request and response shapes shared by the agents and providers.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Agent instructions.
    System,
    /// Rendered prompt for this step.
    User,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

/// Completion request built by an agent for one workflow step.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model name as the provider knows it.
    pub model: String,
    /// System prompt first, then the user prompt.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature; candidates differ only in this.
    pub temperature: Option<f32>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl ChatRequest {
    /// System prompt of the request, if any.
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the last user message, if any.
    #[must_use]
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the request.
    pub prompt_tokens: u32,
    /// Tokens in the reply.
    pub completion_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

/// Completion text plus provider metadata.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Model output, untrimmed.
    pub content: String,
    /// Zeroed when the provider reports nothing.
    pub usage: TokenUsage,
    /// `"length"` means the answer was cut at `max_tokens`.
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Response carrying `content` that finished normally.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        }
    }
}

/// System turn holding an agent's instructions.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::System,
        content: content.to_string(),
    }
}

/// User turn holding the rendered prompt.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(system_message("route this").role, Role::System);
        let msg = user_message("Query: who wrote Dune?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Query: who wrote Dune?");
    }

    #[test]
    fn test_text_response_finishes_normally() {
        let response = ChatResponse::text("Paris");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_request_prompt_accessors() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![system_message("sys"), user_message("hi")],
            temperature: None,
            max_tokens: None,
            json_mode: false,
        };
        assert_eq!(request.system_prompt(), Some("sys"));
        assert_eq!(request.user_prompt(), Some("hi"));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&user_message("hi")).unwrap_or_default();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
