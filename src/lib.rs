//! deskagent: provider routing and offline fallback for an AI agent
//! assistant backend.
//!
//! Every agent role (classifier, title generator, planner, suggestor,
//! computer-use executor) resolves to a chat model handle through
//! [`llm::resolve`]. The handle is backed either by a real provider
//! (OpenAI, Azure OpenAI, Anthropic, AWS Bedrock) or by a deterministic
//! local simulation that preserves the same response contract, so callers
//! never need to know which one they hold. Routing itself never fails: a
//! missing assignment, a private-mode deployment, absent credentials or a
//! broken adapter all degrade to simulation.

pub mod config;
pub mod error;
pub mod llm;
