//! Chat completions over any `OpenAI`-compatible endpoint.
//!
//! Groq is the default base URL; pointing [`AgentConfig::base_url`] at
//! `OpenAI` or a local proxy works the same way.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, ResponseFormat,
};
use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Lower bound on the completion HTTP timeout. Completions are slower than
/// page fetches, so the configured request timeout is raised to this floor.
const MIN_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Provider backed by an `async-openai` client.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAiProvider {
    /// Builds the client with the configured key, base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout.max(MIN_COMPLETION_TIMEOUT))
            .build()
            .map_err(|e| AgentError::ApiRequest {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
            })?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            base_url: config.base_url.clone(),
        })
    }

    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
        }
    }

    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        let messages: Vec<_> = request.messages.iter().map(Self::convert_message).collect();

        let response_format = if request.json_mode {
            Some(ResponseFormat::JsonObject)
        } else {
            None
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            response_format,
            ..Default::default()
        }
    }

    /// Maps an SDK error onto the agent error taxonomy.
    fn map_error(error: OpenAIError) -> AgentError {
        match error {
            OpenAIError::Reqwest(e) if e.is_timeout() => AgentError::Timeout {
                message: e.to_string(),
            },
            OpenAIError::Reqwest(e) => AgentError::ApiRequest {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            OpenAIError::ApiError(api) => {
                let kind = format!(
                    "{} {} {}",
                    api.code.as_deref().unwrap_or_default(),
                    api.r#type.as_deref().unwrap_or_default(),
                    api.message
                )
                .to_ascii_lowercase();

                if kind.contains("invalid_api_key")
                    || kind.contains("authentication")
                    || kind.contains("unauthorized")
                    || kind.contains("invalid api key")
                {
                    AgentError::Authentication {
                        message: api.message,
                    }
                } else if kind.contains("rate_limit") || kind.contains("rate limit") {
                    AgentError::RateLimited {
                        message: api.message,
                    }
                } else {
                    AgentError::ApiRequest {
                        message: api.message,
                        status: None,
                    }
                }
            }
            other => AgentError::ApiRequest {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<async-openai::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(Self::map_error)?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        tracing::debug!(
            model = %request.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion received"
        );

        Ok(ChatResponse {
            content,
            usage,
            finish_reason,
        })
    }
}
