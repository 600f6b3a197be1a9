//! LLM routing for the agent backend.
//!
//! Every agent role resolves to a [`ChatModel`] handle through [`resolve`].
//! Supported backends:
//! - **openai**: Chat Completions with your own API key
//! - **azure_openai**: deployment-scoped Chat Completions
//! - **anthropic**: Messages API, optional extended thinking
//! - **bedrock**: Converse API via the AWS SDK (feature `bedrock`)
//! - **offline simulation**: deterministic fallback whenever no live
//!   provider is usable

mod anthropic;
mod azure;
#[cfg(feature = "bedrock")]
mod bedrock;
mod factory;
mod http;
mod openai;
pub mod parse;
mod provider;
mod routing;
mod simulation;

pub use anthropic::AnthropicModel;
pub use azure::AzureOpenAiModel;
#[cfg(feature = "bedrock")]
pub use bedrock::BedrockModel;
pub use factory::build_model;
pub use openai::OpenAiModel;
pub use provider::{ChatMessage, ChatModel, Completion, GenerationParams, Role};
pub use routing::{Route, SimulationReason, resolve, route};
pub use simulation::{SimulatedModel, simulate};
