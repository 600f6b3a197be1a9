//! Azure OpenAI adapter.
//!
//! Same Chat Completions protocol as OpenAI, addressed by deployment name
//! under the resource endpoint and authenticated with an `api-key` header.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;

use crate::config::AzureOpenAiModelConfig;
use crate::error::LlmError;
use crate::llm::http::send_json_request;
use crate::llm::openai::wire;
use crate::llm::provider::{ChatMessage, ChatModel, Completion, GenerationParams};

const PROVIDER_NAME: &str = "azure_openai";

/// Azure OpenAI deployment model handle.
pub struct AzureOpenAiModel {
    client: Client,
    config: AzureOpenAiModelConfig,
    params: GenerationParams,
}

impl AzureOpenAiModel {
    /// Create a new Azure OpenAI model handle.
    pub fn new(config: AzureOpenAiModelConfig, params: GenerationParams) -> Result<Self, LlmError> {
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

    /// Deployment-scoped chat completions URL.
    fn api_url(&self) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            base, self.config.deployment, self.config.api_version
        )
    }
}

#[async_trait]
impl ChatModel for AzureOpenAiModel {
    fn model_name(&self) -> &str {
        &self.config.deployment
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let request = wire::ChatCompletionRequest {
            model: self.config.deployment.clone(),
            messages: messages.iter().map(Into::into).collect(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        let headers = [("api-key", self.config.api_key.expose_secret().to_string())];

        tracing::debug!(
            "Sending request to Azure OpenAI (deployment: {})",
            self.config.deployment
        );

        let response: wire::ChatCompletionResponse =
            send_json_request(&self.client, PROVIDER_NAME, &self.api_url(), &headers, &request)
                .await?;
        wire::completion_from_response(PROVIDER_NAME, response)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn make_model(endpoint: &str) -> AzureOpenAiModel {
        let config = AzureOpenAiModelConfig {
            api_key: SecretString::from("test-key".to_string()),
            endpoint: endpoint.to_string(),
            deployment: "gpt-4o-deploy".to_string(),
            api_version: "2024-12-01-preview".to_string(),
        };
        AzureOpenAiModel::new(config, GenerationParams::default()).unwrap()
    }

    #[test]
    fn api_url_joins_endpoint_and_deployment() {
        let model = make_model("https://my-resource.openai.azure.com");
        assert_eq!(
            model.api_url(),
            "https://my-resource.openai.azure.com/openai/deployments/gpt-4o-deploy/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn api_url_tolerates_trailing_slash() {
        let model = make_model("https://my-resource.openai.azure.com/");
        assert_eq!(
            model.api_url(),
            "https://my-resource.openai.azure.com/openai/deployments/gpt-4o-deploy/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn model_name_is_the_deployment() {
        let model = make_model("https://my-resource.openai.azure.com");
        assert_eq!(model.model_name(), "gpt-4o-deploy");
    }
}
