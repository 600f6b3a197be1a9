//! OpenAI Chat Completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;

use crate::config::OpenAiModelConfig;
use crate::error::LlmError;
use crate::llm::http::send_json_request;
use crate::llm::provider::{ChatMessage, ChatModel, Completion, GenerationParams};

const API_BASE: &str = "https://api.openai.com";
const PROVIDER_NAME: &str = "openai";

/// OpenAI Chat Completions API model handle.
pub struct OpenAiModel {
    client: Client,
    config: OpenAiModelConfig,
    params: GenerationParams,
}

impl OpenAiModel {
    /// Create a new OpenAI model handle.
    pub fn new(config: OpenAiModelConfig, params: GenerationParams) -> Result<Self, LlmError> {
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
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let request = wire::ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Into::into).collect(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        let url = format!("{API_BASE}/v1/chat/completions");
        let headers = [(
            "Authorization",
            format!("Bearer {}", self.config.api_key.expose_secret()),
        )];

        tracing::debug!("Sending request to OpenAI (model: {})", self.config.model);

        let response: wire::ChatCompletionResponse =
            send_json_request(&self.client, PROVIDER_NAME, &url, &headers, &request).await?;
        wire::completion_from_response(PROVIDER_NAME, response)
    }
}

/// OpenAI-compatible Chat Completions wire types, shared with the Azure
/// adapter which speaks the same protocol.
pub(crate) mod wire {
    use serde::{Deserialize, Serialize};

    use crate::error::LlmError;
    use crate::llm::provider::{ChatMessage, Completion, Role};

    #[derive(Debug, Serialize)]
    pub(crate) struct ChatCompletionRequest {
        pub model: String,
        pub messages: Vec<ChatCompletionMessage>,
        pub temperature: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub max_tokens: Option<u32>,
    }

    #[derive(Debug, Serialize)]
    pub(crate) struct ChatCompletionMessage {
        pub role: String,
        pub content: String,
    }

    impl From<&ChatMessage> for ChatCompletionMessage {
        fn from(msg: &ChatMessage) -> Self {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            Self {
                role: role.to_string(),
                content: msg.content.clone(),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct ChatCompletionResponse {
        pub choices: Vec<ChatCompletionChoice>,
        pub usage: ChatCompletionUsage,
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct ChatCompletionChoice {
        pub message: ChatCompletionResponseMessage,
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct ChatCompletionResponseMessage {
        pub content: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct ChatCompletionUsage {
        pub prompt_tokens: u32,
        pub completion_tokens: u32,
    }

    /// Extract the first choice into a [`Completion`].
    pub(crate) fn completion_from_response(
        provider: &str,
        response: ChatCompletionResponse,
    ) -> Result<Completion, LlmError> {
        let usage = response.usage;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: provider.to_string(),
                reason: "no choices in response".to_string(),
            })?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}
