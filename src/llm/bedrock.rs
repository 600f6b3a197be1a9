//! AWS Bedrock adapter using the native Converse API.
//!
//! Uses `aws-sdk-bedrockruntime` to call `client.converse()` directly. The
//! SDK credential chain handles IAM credentials from the environment;
//! region, timeouts and retries are pinned at construction.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message,
    SystemContentBlock,
};
use aws_smithy_types::{Document, Number};

use crate::config::BedrockModelConfig;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, ChatModel, Completion, GenerationParams, Role};

const PROVIDER_NAME: &str = "bedrock";

/// Connect/read timeout for Converse calls.
const API_TIMEOUT: Duration = Duration::from_secs(300);

/// Total attempts (initial + retries) configured on the SDK.
const MAX_ATTEMPTS: u32 = 5;

/// Reasoning budget attached when extended thinking applies.
const THINKING_BUDGET_TOKENS: u32 = 2000;

/// Reasoning budget for `model_id`, if extended thinking applies to it.
///
/// Bedrock only honors the thinking block for claude-family models; for
/// anything else the flag is silently ignored.
pub(crate) fn resolve_thinking_budget(extended_thinking: bool, model_id: &str) -> Option<u32> {
    (extended_thinking && model_id.contains("claude")).then_some(THINKING_BUDGET_TOKENS)
}

/// Provider-specific request fields carrying the thinking budget.
fn thinking_request_fields(budget_tokens: u32) -> Document {
    let mut thinking = HashMap::new();
    thinking.insert(
        "type".to_string(),
        Document::String("enabled".to_string()),
    );
    thinking.insert(
        "budget_tokens".to_string(),
        Document::Number(Number::PosInt(budget_tokens as u64)),
    );
    let mut fields = HashMap::new();
    fields.insert("thinking".to_string(), Document::Object(thinking));
    Document::Object(fields)
}

/// AWS Bedrock Converse API model handle.
pub struct BedrockModel {
    client: Client,
    config: BedrockModelConfig,
    params: GenerationParams,
    /// Budget resolved once at construction; `None` means no thinking
    /// block is sent.
    thinking_budget: Option<u32>,
}

impl BedrockModel {
    /// Create a new Bedrock model handle.
    ///
    /// Uses `block_in_place` because the AWS SDK config loader is async but
    /// provider construction is sync. Requires the multi-threaded tokio
    /// runtime.
    pub fn new(config: BedrockModelConfig, params: GenerationParams) -> Result<Self, LlmError> {
        let sdk_config = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .timeout_config(
                        TimeoutConfig::builder()
                            .connect_timeout(API_TIMEOUT)
                            .read_timeout(API_TIMEOUT)
                            .build(),
                    )
                    .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS))
                    .load()
                    .await
            })
        });

        let client = Client::new(&sdk_config);
        let thinking_budget = resolve_thinking_budget(params.extended_thinking, &config.model);

        Ok(Self {
            client,
            config,
            params,
            thinking_budget,
        })
    }

    /// Reasoning budget carried by this handle, if any.
    pub fn thinking_budget(&self) -> Option<u32> {
        self.thinking_budget
    }
}

#[async_trait]
impl ChatModel for BedrockModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let (system_blocks, converse_messages) = convert_messages(messages)?;

        let mut inference = InferenceConfiguration::builder().temperature(self.params.temperature);
        if let Some(max_tokens) = self.params.max_tokens {
            inference = inference.max_tokens(max_tokens as i32);
        }

        let mut builder = self
            .client
            .converse()
            .model_id(&self.config.model)
            .set_system(if system_blocks.is_empty() {
                None
            } else {
                Some(system_blocks)
            })
            .set_messages(Some(converse_messages))
            .inference_config(inference.build());

        if let Some(budget) = self.thinking_budget {
            builder = builder.additional_model_request_fields(thinking_request_fields(budget));
        }

        tracing::debug!(
            "Sending Converse request to Bedrock (model: {})",
            self.config.model
        );

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: e.to_string(),
        })?;

        let content = extract_text(response.output())?;
        let (input_tokens, output_tokens) = match response.usage() {
            Some(usage) => (usage.input_tokens() as u32, usage.output_tokens() as u32),
            None => (0, 0),
        };

        Ok(Completion {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

/// Convert the conversation to Converse API format; system messages become
/// top-level system content blocks.
fn convert_messages(
    messages: &[ChatMessage],
) -> Result<(Vec<SystemContentBlock>, Vec<Message>), LlmError> {
    let mut system_blocks = Vec::new();
    let mut converse_messages = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_blocks.push(SystemContentBlock::Text(msg.content.clone())),
            Role::User | Role::Assistant => {
                let role = if msg.role == Role::User {
                    ConversationRole::User
                } else {
                    ConversationRole::Assistant
                };
                let message = Message::builder()
                    .role(role)
                    .content(ContentBlock::Text(msg.content.clone()))
                    .build()
                    .map_err(|e| LlmError::RequestFailed {
                        provider: PROVIDER_NAME.to_string(),
                        reason: format!("failed to build message: {e}"),
                    })?;
                converse_messages.push(message);
            }
        }
    }

    Ok((system_blocks, converse_messages))
}

fn extract_text(output: Option<&ConverseOutput>) -> Result<String, LlmError> {
    let Some(ConverseOutput::Message(message)) = output else {
        return Err(LlmError::InvalidResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: "response carried no message output".to_string(),
        });
    };

    let text = message
        .content()
        .iter()
        .filter_map(|block| block.as_text().ok())
        .cloned()
        .collect::<Vec<String>>()
        .join("");

    Ok(text)
}
