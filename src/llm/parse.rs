//! JSON extraction from free-text model output.
//!
//! Live models wrap their JSON in prose more often than not; downstream
//! role handlers pull the outermost document out of `Completion::content`
//! before deserializing. Simulated handles emit bare JSON, which passes
//! through unchanged.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"));

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"));

/// Errors from model-output parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON document found in model response")]
    NoJsonFound,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extract and parse the outermost JSON object in `raw`.
pub fn extract_json_object(raw: &str) -> Result<Value, ParseError> {
    let found = OBJECT_RE.find(raw).ok_or(ParseError::NoJsonFound)?;
    Ok(serde_json::from_str(found.as_str())?)
}

/// Extract and parse the outermost JSON array in `raw`.
pub fn extract_json_array(raw: &str) -> Result<Value, ParseError> {
    let found = ARRAY_RE.find(raw).ok_or(ParseError::NoJsonFound)?;
    Ok(serde_json::from_str(found.as_str())?)
}
