//! Configuration for deskagent.
//!
//! Everything is resolved from process environment variables, freshly on
//! every routing decision: the per-role provider/model assignment, the
//! private-mode policy, and provider credentials. Nothing is cached, so
//! rotated credentials or redeployed configuration are picked up without a
//! restart.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Azure OpenAI api-version sent when `OPENAI_API_VERSION` is unset.
const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Bedrock region used when `BEDROCK_REGION` is unset.
const DEFAULT_BEDROCK_REGION: &str = "us-east-1";

/// Load variables from a `.env` file if one is present.
///
/// Missing files are ignored. Call once at startup, before the first
/// routing decision.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// A logical calling context that gets its own model assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Classifies an incoming message as a desktop task or plain inquiry.
    Classifier,
    /// Generates a short thread title.
    Title,
    /// Breaks a task into ordered subtasks.
    Planner,
    /// Proposes follow-up suggestions.
    Suggestor,
    /// Drives the desktop automation loop.
    ComputerUse,
    /// Any future role, addressed by its configuration name.
    Other(String),
}

impl AgentRole {
    /// Canonical lowercase tag, as used in simulated payloads.
    pub fn name(&self) -> &str {
        match self {
            Self::Classifier => "classifier",
            Self::Title => "title",
            Self::Planner => "planner",
            Self::Suggestor => "suggestor",
            Self::ComputerUse => "computer_use",
            Self::Other(name) => name,
        }
    }

    /// Environment variable prefix for this role's model assignment.
    ///
    /// [`RoleModelConfig::resolve`] reads `{PREFIX}_AGENT_MODEL_TYPE` and
    /// `{PREFIX}_AGENT_MODEL_ID`. Centralised here so routing and
    /// deployment tooling stay in sync.
    pub fn env_prefix(&self) -> String {
        self.name().to_uppercase()
    }

    /// Map a configuration name back to a role.
    pub fn from_name(name: &str) -> Self {
        match name {
            "classifier" => Self::Classifier,
            "title" => Self::Title,
            "planner" => Self::Planner,
            "suggestor" => Self::Suggestor,
            "computer_use" => Self::ComputerUse,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which provider backs a model assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Direct OpenAI API
    OpenAi,
    /// Azure OpenAI deployment
    AzureOpenAi,
    /// Direct Anthropic API
    Anthropic,
    /// AWS Bedrock Converse API
    Bedrock,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "azure_openai" | "azure-openai" | "azure" => Ok(Self::AzureOpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "bedrock" | "aws_bedrock" => Ok(Self::Bedrock),
            _ => Err(format!(
                "invalid provider kind '{}', expected one of: openai, azure_openai, anthropic, bedrock",
                s
            )),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::AzureOpenAi => write!(f, "azure_openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Bedrock => write!(f, "bedrock"),
        }
    }
}

impl ProviderKind {
    /// Report whether the environment holds every secret this provider
    /// requires. Pure read; an absent or unreadable variable is simply
    /// `false`.
    pub fn has_credentials(&self) -> bool {
        match self {
            Self::OpenAi => env_is_set("OPENAI_API_KEY"),
            Self::AzureOpenAi => {
                env_is_set("AZURE_OPENAI_API_KEY") && env_is_set("AZURE_OPENAI_ENDPOINT")
            }
            Self::Anthropic => env_is_set("ANTHROPIC_API_KEY"),
            Self::Bedrock => {
                env_is_set("AWS_ACCESS_KEY_ID") && env_is_set("AWS_SECRET_ACCESS_KEY")
            }
        }
    }
}

/// Per-role provider/model assignment, read fresh on every routing
/// decision.
#[derive(Debug, Clone)]
pub struct RoleModelConfig {
    pub provider: ProviderKind,
    pub model_id: String,
}

impl RoleModelConfig {
    /// Resolve the assignment for `role`, or `None` when it is incomplete.
    ///
    /// An unparseable provider tag also counts as incomplete (logged), so a
    /// typo in deployment configuration degrades to simulation instead of
    /// failing requests.
    pub fn resolve(role: &AgentRole) -> Option<Self> {
        let prefix = role.env_prefix();
        let kind = optional_env(&format!("{prefix}_AGENT_MODEL_TYPE"))
            .ok()
            .flatten()?;
        let model_id = optional_env(&format!("{prefix}_AGENT_MODEL_ID"))
            .ok()
            .flatten()?;

        match kind.parse::<ProviderKind>() {
            Ok(provider) => Some(Self { provider, model_id }),
            Err(e) => {
                tracing::warn!(role = role.name(), "{e}; treating role as unconfigured");
                None
            }
        }
    }
}

/// Deployment privacy policy.
#[derive(Debug, Clone, Copy)]
pub struct PrivacyPolicy {
    /// `PRIVATE_MODE`: prefer fully local operation.
    pub private_mode: bool,
    /// `USE_REAL_LLM_IN_PRIVATE_MODE`: explicit opt-in to live calls while
    /// private mode is on.
    pub use_real_llm_in_private_mode: bool,
}

impl PrivacyPolicy {
    /// Read the current policy flags.
    pub fn from_env() -> Self {
        Self {
            private_mode: flag_env("PRIVATE_MODE"),
            use_real_llm_in_private_mode: flag_env("USE_REAL_LLM_IN_PRIVATE_MODE"),
        }
    }

    /// Private mode defaults to fully offline behavior unless live calls
    /// are explicitly enabled.
    pub fn blocks_live_providers(&self) -> bool {
        self.private_mode && !self.use_real_llm_in_private_mode
    }
}

/// Configuration for the OpenAI Chat Completions adapter.
#[derive(Debug, Clone)]
pub struct OpenAiModelConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl OpenAiModelConfig {
    pub fn from_env(model_id: &str) -> Result<Self, ConfigError> {
        let api_key = require_secret(
            "OPENAI_API_KEY",
            "Set OPENAI_API_KEY when a role is assigned to openai",
        )?;
        Ok(Self {
            api_key,
            model: model_id.to_string(),
        })
    }
}

/// Configuration for the Azure OpenAI adapter.
#[derive(Debug, Clone)]
pub struct AzureOpenAiModelConfig {
    pub api_key: SecretString,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// Deployment name (the model id slot in the role assignment).
    pub deployment: String,
    pub api_version: String,
}

impl AzureOpenAiModelConfig {
    pub fn from_env(model_id: &str) -> Result<Self, ConfigError> {
        let api_key = require_secret(
            "AZURE_OPENAI_API_KEY",
            "Set AZURE_OPENAI_API_KEY when a role is assigned to azure_openai",
        )?;
        let endpoint = optional_env("AZURE_OPENAI_ENDPOINT")?.ok_or_else(|| {
            ConfigError::MissingRequired {
                key: "AZURE_OPENAI_ENDPOINT".to_string(),
                hint: "Set AZURE_OPENAI_ENDPOINT when a role is assigned to azure_openai"
                    .to_string(),
            }
        })?;
        let api_version = optional_env("OPENAI_API_VERSION")?
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
        Ok(Self {
            api_key,
            endpoint,
            deployment: model_id.to_string(),
            api_version,
        })
    }
}

/// Configuration for the Anthropic adapter.
#[derive(Debug, Clone)]
pub struct AnthropicModelConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl AnthropicModelConfig {
    pub fn from_env(model_id: &str) -> Result<Self, ConfigError> {
        let api_key = require_secret(
            "ANTHROPIC_API_KEY",
            "Set ANTHROPIC_API_KEY when a role is assigned to anthropic",
        )?;
        Ok(Self {
            api_key,
            model: model_id.to_string(),
        })
    }
}

/// Configuration for the AWS Bedrock adapter.
///
/// Credentials themselves stay in the environment; the SDK credential
/// chain reads them directly.
#[derive(Debug, Clone)]
pub struct BedrockModelConfig {
    pub model: String,
    pub region: String,
}

impl BedrockModelConfig {
    pub fn from_env(model_id: &str) -> Result<Self, ConfigError> {
        let region =
            optional_env("BEDROCK_REGION")?.unwrap_or_else(|| DEFAULT_BEDROCK_REGION.to_string());
        Ok(Self {
            model: model_id.to_string(),
            region,
        })
    }
}

// Helper functions

fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

/// Tolerant boolean flag: "true"/"1" (case-insensitive) is true, anything
/// else (including a read error) is false. Policy flags must never fail a
/// routing decision.
fn flag_env(key: &str) -> bool {
    matches!(
        optional_env(key),
        Ok(Some(v)) if v.eq_ignore_ascii_case("true") || v == "1"
    )
}

fn env_is_set(key: &str) -> bool {
    matches!(optional_env(key), Ok(Some(_)))
}

fn require_secret(key: &str, hint: &str) -> Result<SecretString, ConfigError> {
    optional_env(key)?
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingRequired {
            key: key.to_string(),
            hint: hint.to_string(),
        })
}

// Env vars are process-global, so tests that mutate them are serialized on
// this lock, across every module of the crate.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
