//! Chat model capability trait and conversation types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller-supplied generation parameters, applied verbatim by whichever
/// backend the routing decision selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Request a provider-side extended reasoning budget where supported.
    pub extended_thinking: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            extended_thinking: false,
        }
    }
}

impl GenerationParams {
    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Enable extended thinking.
    pub fn with_extended_thinking(mut self) -> Self {
        self.extended_thinking = true;
        self
    }
}

/// One generated reply.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A ready-to-invoke chat model.
///
/// Implemented by every live provider adapter and by the offline
/// simulation. Callers hold `Arc<dyn ChatModel>` and must not need to know
/// which variant they have.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Generate one reply for an ordered conversation.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError>;
}
