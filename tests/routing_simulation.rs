//! End-to-end routing and fallback scenarios.
//!
//! These tests mutate process environment variables; a static mutex keeps
//! them serialized within this binary.

use std::sync::Mutex;

use deskagent::config::AgentRole;
use deskagent::llm::{
    ChatMessage, ChatModel, GenerationParams, Route, SimulationReason, resolve, route,
};
use serde_json::Value;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const ROUTING_VARS: &[&str] = &[
    "CLASSIFIER_AGENT_MODEL_TYPE",
    "CLASSIFIER_AGENT_MODEL_ID",
    "TITLE_AGENT_MODEL_TYPE",
    "TITLE_AGENT_MODEL_ID",
    "PLANNER_AGENT_MODEL_TYPE",
    "PLANNER_AGENT_MODEL_ID",
    "SUGGESTOR_AGENT_MODEL_TYPE",
    "SUGGESTOR_AGENT_MODEL_ID",
    "COMPUTER_USE_AGENT_MODEL_TYPE",
    "COMPUTER_USE_AGENT_MODEL_ID",
    "PRIVATE_MODE",
    "USE_REAL_LLM_IN_PRIVATE_MODE",
    "OPENAI_API_KEY",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "ANTHROPIC_API_KEY",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
];

fn set_var(key: &str, value: &str) {
    // SAFETY: callers hold ENV_LOCK.
    unsafe { std::env::set_var(key, value) };
}

fn clear_env() {
    for var in ROUTING_VARS {
        // SAFETY: callers hold ENV_LOCK.
        unsafe { std::env::remove_var(var) };
    }
}

fn all_roles() -> Vec<AgentRole> {
    vec![
        AgentRole::Classifier,
        AgentRole::Title,
        AgentRole::Planner,
        AgentRole::Suggestor,
        AgentRole::ComputerUse,
        AgentRole::Other("research".to_string()),
    ]
}

async fn generate_payload(role: &AgentRole, message: &str) -> Value {
    let handle = {
        let _lock = ENV_LOCK.lock();
        clear_env();
        resolve(role, GenerationParams::default())
    };
    let completion = handle
        .generate(&[ChatMessage::user(message)])
        .await
        .expect("simulated generation never fails");
    serde_json::from_str(&completion.content).expect("simulated content is valid JSON")
}

#[tokio::test]
async fn resolve_yields_a_working_handle_for_every_role() {
    for role in all_roles() {
        let handle = {
            let _lock = ENV_LOCK.lock();
            clear_env();
            resolve(&role, GenerationParams::default())
        };
        let completion = handle
            .generate(&[ChatMessage::user("open the calendar")])
            .await
            .expect("generation should succeed");
        let payload: Value =
            serde_json::from_str(&completion.content).expect("content should be JSON");
        assert!(payload.is_object(), "role {role:?} produced: {payload}");
    }
}

#[test]
fn private_mode_forces_simulation_despite_full_configuration() {
    let _lock = ENV_LOCK.lock();
    clear_env();
    set_var("CLASSIFIER_AGENT_MODEL_TYPE", "openai");
    set_var("CLASSIFIER_AGENT_MODEL_ID", "gpt-4o");
    set_var("OPENAI_API_KEY", "sk-test");
    set_var("PRIVATE_MODE", "true");

    match route(&AgentRole::Classifier, &GenerationParams::default()) {
        Route::Simulated(reason) => assert_eq!(reason, SimulationReason::PrivateMode),
        Route::Live(_) => panic!("expected simulation under private mode"),
    }

    clear_env();
}

#[test]
fn private_mode_override_restores_live_routing() {
    let _lock = ENV_LOCK.lock();
    clear_env();
    set_var("CLASSIFIER_AGENT_MODEL_TYPE", "openai");
    set_var("CLASSIFIER_AGENT_MODEL_ID", "gpt-4o");
    set_var("OPENAI_API_KEY", "sk-test");
    set_var("PRIVATE_MODE", "true");
    set_var("USE_REAL_LLM_IN_PRIVATE_MODE", "true");

    match route(&AgentRole::Classifier, &GenerationParams::default()) {
        Route::Live(model) => assert_eq!(model.model_name(), "gpt-4o"),
        Route::Simulated(reason) => panic!("expected live handle, got {reason:?}"),
    }

    clear_env();
}

#[test]
fn verified_absent_credentials_force_simulation_outside_private_mode() {
    let _lock = ENV_LOCK.lock();
    clear_env();
    set_var("PLANNER_AGENT_MODEL_TYPE", "bedrock");
    set_var(
        "PLANNER_AGENT_MODEL_ID",
        "anthropic.claude-sonnet-4-20250514-v1:0",
    );

    match route(&AgentRole::Planner, &GenerationParams::default()) {
        Route::Simulated(reason) => assert_eq!(reason, SimulationReason::MissingCredentials),
        Route::Live(_) => panic!("expected simulation without credentials"),
    }

    clear_env();
}

#[test]
fn unconfigured_role_wins_over_private_mode() {
    let _lock = ENV_LOCK.lock();
    clear_env();
    set_var("PRIVATE_MODE", "true");

    match route(&AgentRole::Title, &GenerationParams::default()) {
        Route::Simulated(reason) => assert_eq!(reason, SimulationReason::Unconfigured),
        Route::Live(_) => panic!("expected simulation for unconfigured role"),
    }

    clear_env();
}

#[test]
fn azure_routes_live_when_both_secrets_present() {
    let _lock = ENV_LOCK.lock();
    clear_env();
    set_var("TITLE_AGENT_MODEL_TYPE", "azure_openai");
    set_var("TITLE_AGENT_MODEL_ID", "gpt-4o-deploy");
    set_var("AZURE_OPENAI_API_KEY", "key");
    set_var("AZURE_OPENAI_ENDPOINT", "https://r.openai.azure.com");

    match route(&AgentRole::Title, &GenerationParams::default()) {
        Route::Live(model) => assert_eq!(model.model_name(), "gpt-4o-deploy"),
        Route::Simulated(reason) => panic!("expected live handle, got {reason:?}"),
    }

    clear_env();
}

#[tokio::test]
async fn simulation_is_deterministic_across_calls() {
    let first = generate_payload(&AgentRole::Classifier, "please open the calculator app").await;
    let second = generate_payload(&AgentRole::Classifier, "please open the calculator app").await;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn classifier_simulation_matches_contract() {
    let payload = generate_payload(&AgentRole::Classifier, "please open the calculator app").await;
    assert_eq!(payload["type"], "desktop_task");
    assert_eq!(payload["is_browser_task"], false);

    let payload = generate_payload(&AgentRole::Classifier, "what is the capital of France").await;
    assert_eq!(payload["type"], "inquiry");
    assert!(
        payload["response"]
            .as_str()
            .unwrap()
            .starts_with("Respuesta: ")
    );
}

#[tokio::test]
async fn title_simulation_matches_contract() {
    let payload = generate_payload(
        &AgentRole::Title,
        "   schedule   a meeting for   tomorrow at noon with the team about budget planning  ",
    )
    .await;
    assert_eq!(
        payload["title"],
        "Schedule A Meeting For Tomorrow At Noon With"
    );

    let payload = generate_payload(&AgentRole::Title, "   ").await;
    assert_eq!(payload["title"], "Task");
}

#[tokio::test]
async fn planner_simulation_emits_one_bounded_subtask() {
    let goal = "sort ".repeat(100);
    let payload = generate_payload(&AgentRole::Planner, &goal).await;
    let subtasks = payload["subtasks"].as_array().unwrap();
    assert_eq!(subtasks.len(), 1);
    assert!(subtasks[0]["subtask"].as_str().unwrap().chars().count() <= 160);
    assert_eq!(subtasks[0]["type"], "desktop_subtask");
}

#[tokio::test]
async fn computer_use_simulation_signals_immediate_completion() {
    let payload = generate_payload(&AgentRole::ComputerUse, "click the save button").await;
    let actions = payload["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action"], "subtask_completed");
    assert!(actions[0]["params"].as_object().unwrap().is_empty());
}
