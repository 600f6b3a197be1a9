//! Deterministic offline stand-in for every agent role.
//!
//! Used whenever routing cannot produce a live provider handle: missing
//! configuration or credentials, private-mode deployments, or a failed
//! adapter construction. Every payload is a pure function of the role and
//! input text, with no randomness and no I/O, so offline deployments stay
//! usable and tests are reproducible.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::AgentRole;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, ChatModel, Completion, Role};

/// Verbs that indicate the user wants something done on the desktop rather
/// than answered in chat. English plus Spanish deployments.
const DESKTOP_VERBS: &[&str] = &[
    "open", "abrir", "launch", "inicia", "iniciar", "click", "clic", "type", "escribe", "send",
    "enviar", "navigate", "navega", "buscar", "search",
];

const BROWSER_TERMS: &[&str] = &["web", "browser", "navega", "http", "https"];

const MEMORY_TERMS: &[&str] = &["otra vez", "again", "igual", "mismo", "previous"];

const BACKGROUND_TERMS: &[&str] = &["background", "segundo plano"];

const EXTENDED_THINKING_TERMS: &[&str] = &["think more", "pensar más", "full analysis"];

/// Characters of input echoed back for inquiries.
const ECHO_LIMIT: usize = 120;

/// Characters of goal text carried into the single planner subtask.
const SUBTASK_LIMIT: usize = 160;

/// Words kept in a generated title.
const TITLE_WORDS: usize = 8;

/// Build the role-specific payload for `last_user_message`.
///
/// Always a JSON document matching the shape downstream role handlers
/// parse out of live model output.
pub fn simulate(role: &AgentRole, last_user_message: &str) -> Value {
    match role {
        AgentRole::Classifier => classify(last_user_message),
        AgentRole::Title => title(last_user_message),
        AgentRole::Planner => plan(last_user_message),
        AgentRole::Suggestor => json!({ "suggestions": [] }),
        AgentRole::ComputerUse => computer_use(),
        AgentRole::Other(name) => json!({ "message": "placeholder", "agent": name }),
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

fn classify(text: &str) -> Value {
    let lower = text.to_lowercase();
    let is_desktop = contains_any(&lower, DESKTOP_VERBS);
    let response = if is_desktop {
        "Entendido, comenzaré.".to_string()
    } else {
        format!("Respuesta: {}", truncate_chars(text, ECHO_LIMIT))
    };
    json!({
        "type": if is_desktop { "desktop_task" } else { "inquiry" },
        "response": response,
        "is_browser_task": contains_any(&lower, BROWSER_TERMS),
        "needs_memory_from_previous_tasks": contains_any(&lower, MEMORY_TERMS),
        "is_background_mode_requested": contains_any(&lower, BACKGROUND_TERMS),
        "is_extended_thinking_mode_requested": contains_any(&lower, EXTENDED_THINKING_TERMS),
    })
}

fn title(text: &str) -> Value {
    let short = text
        .split_whitespace()
        .take(TITLE_WORDS)
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ");
    let title = if short.is_empty() {
        "Task".to_string()
    } else {
        short
    };
    json!({ "title": title })
}

fn plan(goal: &str) -> Value {
    let collapsed = collapse_whitespace(goal);
    json!({
        "subtasks": [{
            "subtask": truncate_chars(&collapsed, SUBTASK_LIMIT),
            "type": "desktop_subtask",
        }]
    })
}

/// Fixed completion payload: the single action tells the caller's control
/// loop to terminate immediately instead of touching the environment.
fn computer_use() -> Value {
    json!({
        "current_state": {
            "evaluation_previous_goal": "Unknown",
            "memory": "no-op",
            "save_to_memory": false,
            "next_goal": "",
        },
        "actions": [{ "action": "subtask_completed", "params": {} }],
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `limit` Unicode scalars. Model text is routinely
/// non-ASCII; byte slicing could split a code point.
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Offline stand-in satisfying the same [`ChatModel`] contract as a live
/// provider handle.
pub struct SimulatedModel {
    role: AgentRole,
    name: String,
}

impl SimulatedModel {
    /// Create a simulated model for `role`.
    pub fn new(role: AgentRole) -> Self {
        let name = format!("simulated-{}", role.name());
        Self { role, name }
    }

    /// Pick the text the simulation reacts to: the most recent user
    /// message, falling back to the last message of any role.
    fn last_user_text(messages: &[ChatMessage]) -> &str {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .or_else(|| messages.last())
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

#[async_trait]
impl ChatModel for SimulatedModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let payload = simulate(&self.role, Self::last_user_text(messages));
        let content = serde_json::to_string(&payload)?;
        Ok(Completion {
            content,
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}
