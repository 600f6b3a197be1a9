//! Anthropic Messages API adapter.
//!
//! Supports the extended-thinking mode: when requested at construction,
//! every request carries a bounded reasoning-token budget.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AnthropicModelConfig;
use crate::error::LlmError;
use crate::llm::http::send_json_request;
use crate::llm::provider::{ChatMessage, ChatModel, Completion, GenerationParams, Role};

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const PROVIDER_NAME: &str = "anthropic";

/// Max tokens sent when the caller leaves it unset (the API requires one).
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Reasoning budget attached when extended thinking is requested.
const THINKING_BUDGET_TOKENS: u32 = 2000;

/// Anthropic Messages API model handle.
pub struct AnthropicModel {
    client: Client,
    config: AnthropicModelConfig,
    params: GenerationParams,
}

impl AnthropicModel {
    /// Create a new Anthropic model handle.
    pub fn new(config: AnthropicModelConfig, params: GenerationParams) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Unavailable {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            params,
        })
    }

    fn thinking(&self) -> Option<ThinkingConfig> {
        self.params.extended_thinking.then(|| ThinkingConfig {
            thinking_type: "enabled".to_string(),
            budget_tokens: THINKING_BUDGET_TOKENS,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let (system, api_messages) = convert_messages(messages);

        let request = MessagesRequest {
            model: self.config.model.clone(),
            messages: api_messages,
            max_tokens: self.params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: self.params.temperature,
            thinking: self.thinking(),
        };
        let url = format!("{API_BASE}/v1/messages");
        let headers = [
            (
                "x-api-key",
                self.config.api_key.expose_secret().to_string(),
            ),
            ("anthropic-version", API_VERSION.to_string()),
        ];

        tracing::debug!(
            "Sending request to Anthropic Messages API (model: {})",
            self.config.model
        );

        let response: MessagesResponse =
            send_json_request(&self.client, PROVIDER_NAME, &url, &headers, &request).await?;

        let content = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(Completion {
            content,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}

// -- Anthropic Messages API request/response types --

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    thinking_type: String,
    budget_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

/// Response content blocks. Thinking blocks show up when extended thinking
/// is enabled; only the text blocks make it into the completion.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "thinking")]
    Thinking {},
    #[serde(rename = "redacted_thinking")]
    RedactedThinking {},
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// -- Message conversion --

/// Convert a conversation to Messages API format: system messages
/// accumulate into the top-level `system` field.
fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<ApiMessage>) {
    let mut system_text: Option<String> = None;
    let mut api_messages = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                if let Some(ref mut existing) = system_text {
                    existing.push_str("\n\n");
                    existing.push_str(&msg.content);
                } else {
                    system_text = Some(msg.content.clone());
                }
            }
            Role::User => api_messages.push(ApiMessage {
                role: "user".to_string(),
                content: msg.content.clone(),
            }),
            Role::Assistant => api_messages.push(ApiMessage {
                role: "assistant".to_string(),
                content: msg.content.clone(),
            }),
        }
    }

    (system_text, api_messages)
}
