//! Routing engine: agent role to chat model handle.
//!
//! Resolution never fails. Every gate that cannot produce a live provider
//! short-circuits to the offline simulation, so callers always get a
//! usable handle regardless of configuration, policy or credential state.

use std::sync::Arc;

use crate::config::{AgentRole, PrivacyPolicy, RoleModelConfig};
use crate::llm::factory::build_model;
use crate::llm::provider::{ChatModel, GenerationParams};
use crate::llm::simulation::SimulatedModel;

/// Why a routing decision fell back to simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationReason {
    /// The role has no complete provider/model assignment.
    Unconfigured,
    /// Private mode forbids live provider calls.
    PrivateMode,
    /// The configured provider's secrets are absent.
    MissingCredentials,
    /// The provider adapter could not be constructed.
    ConstructionFailed,
}

/// Outcome of one routing decision.
pub enum Route {
    /// A live provider-backed handle.
    Live(Arc<dyn ChatModel>),
    /// Simulation, with the gate that triggered it.
    Simulated(SimulationReason),
}

/// Decide how to serve `role`.
///
/// Gate order is load-bearing: an incomplete assignment wins over private
/// mode, which wins over missing credentials, which wins over construction
/// failures. Configuration is read fresh on every call.
pub fn route(role: &AgentRole, params: &GenerationParams) -> Route {
    let Some(config) = RoleModelConfig::resolve(role) else {
        return Route::Simulated(SimulationReason::Unconfigured);
    };

    if PrivacyPolicy::from_env().blocks_live_providers() {
        return Route::Simulated(SimulationReason::PrivateMode);
    }

    if !config.provider.has_credentials() {
        tracing::warn!(
            role = role.name(),
            provider = %config.provider,
            "credentials missing, serving simulated responses"
        );
        return Route::Simulated(SimulationReason::MissingCredentials);
    }

    match build_model(config.provider, &config.model_id, params) {
        Ok(model) => Route::Live(model),
        Err(err) => {
            tracing::warn!(
                role = role.name(),
                provider = %config.provider,
                error = %err,
                "provider construction failed, serving simulated responses"
            );
            Route::Simulated(SimulationReason::ConstructionFailed)
        }
    }
}

/// Resolve a ready-to-invoke chat model handle for `role`.
///
/// Never fails: any gate that blocks a live provider yields a simulated
/// handle satisfying the identical generation contract.
pub fn resolve(role: &AgentRole, params: GenerationParams) -> Arc<dyn ChatModel> {
    match route(role, &params) {
        Route::Live(model) => model,
        Route::Simulated(reason) => {
            tracing::debug!(role = role.name(), ?reason, "serving simulated model");
            Arc::new(SimulatedModel::new(role.clone()))
        }
    }
}
