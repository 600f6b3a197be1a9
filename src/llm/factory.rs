//! Provider construction.
//!
//! Turns a (provider kind, model id, params) triple into a live
//! [`ChatModel`] handle. Every failure (missing secrets, a client build
//! error, an adapter compiled out) comes back as an `Err`, never a panic,
//! so the routing engine can degrade to simulation.

use std::sync::Arc;

use crate::config::{AnthropicModelConfig, AzureOpenAiModelConfig, OpenAiModelConfig, ProviderKind};
use crate::error::{ConfigError, LlmError};
use crate::llm::anthropic::AnthropicModel;
use crate::llm::azure::AzureOpenAiModel;
use crate::llm::openai::OpenAiModel;
use crate::llm::provider::{ChatModel, GenerationParams};

/// Build a live model handle for `kind`.
pub fn build_model(
    kind: ProviderKind,
    model_id: &str,
    params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    match kind {
        ProviderKind::OpenAi => create_openai_model(model_id, params),
        ProviderKind::AzureOpenAi => create_azure_openai_model(model_id, params),
        ProviderKind::Anthropic => create_anthropic_model(model_id, params),
        ProviderKind::Bedrock => create_bedrock_model(model_id, params),
    }
}

fn unavailable(kind: ProviderKind, err: ConfigError) -> LlmError {
    LlmError::Unavailable {
        provider: kind.to_string(),
        reason: err.to_string(),
    }
}

fn create_openai_model(
    model_id: &str,
    params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let config =
        OpenAiModelConfig::from_env(model_id).map_err(|e| unavailable(ProviderKind::OpenAi, e))?;
    let model = OpenAiModel::new(config, *params)?;
    tracing::info!("Using OpenAI API (model: {model_id})");
    Ok(Arc::new(model))
}

fn create_azure_openai_model(
    model_id: &str,
    params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let config = AzureOpenAiModelConfig::from_env(model_id)
        .map_err(|e| unavailable(ProviderKind::AzureOpenAi, e))?;
    let model = AzureOpenAiModel::new(config, *params)?;
    tracing::info!("Using Azure OpenAI API (deployment: {model_id})");
    Ok(Arc::new(model))
}

fn create_anthropic_model(
    model_id: &str,
    params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let config = AnthropicModelConfig::from_env(model_id)
        .map_err(|e| unavailable(ProviderKind::Anthropic, e))?;
    let model = AnthropicModel::new(config, *params)?;
    tracing::info!("Using Anthropic API (model: {model_id})");
    Ok(Arc::new(model))
}

#[cfg(feature = "bedrock")]
fn create_bedrock_model(
    model_id: &str,
    params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let config = crate::config::BedrockModelConfig::from_env(model_id)
        .map_err(|e| unavailable(ProviderKind::Bedrock, e))?;
    let model = crate::llm::bedrock::BedrockModel::new(config, *params)?;
    tracing::info!("Using AWS Bedrock Converse API (model: {model_id})");
    Ok(Arc::new(model))
}

#[cfg(not(feature = "bedrock"))]
fn create_bedrock_model(
    _model_id: &str,
    _params: &GenerationParams,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    Err(LlmError::Unavailable {
        provider: ProviderKind::Bedrock.to_string(),
        reason: "built without the `bedrock` feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_LOCK;

    #[test]
    fn missing_secret_is_an_unavailable_error_not_a_panic() {
        let _lock = ENV_LOCK.lock();
        // SAFETY: serialized by ENV_LOCK.
        unsafe { std::env::remove_var("OPENAI_API_KEY") };

        let err = match build_model(ProviderKind::OpenAi, "gpt-4o", &GenerationParams::default()) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        match err {
            LlmError::Unavailable { provider, reason } => {
                assert_eq!(provider, "openai");
                assert!(reason.contains("OPENAI_API_KEY"), "reason: {reason}");
            }
            other => panic!("expected Unavailable, got: {other:?}"),
        }
    }

    #[test]
    fn construction_succeeds_with_secrets_present() {
        let _lock = ENV_LOCK.lock();
        // SAFETY: serialized by ENV_LOCK.
        unsafe { std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test") };

        let model = build_model(
            ProviderKind::Anthropic,
            "claude-sonnet-4-20250514",
            &GenerationParams::default(),
        )
        .unwrap();
        assert_eq!(model.model_name(), "claude-sonnet-4-20250514");

        // SAFETY: serialized by ENV_LOCK.
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
    }
}
