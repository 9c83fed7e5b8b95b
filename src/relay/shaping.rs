use crate::error::{RelayError, Result};
use serde_json::Value;

pub const JSON_FENCE_OPEN: &str = "```json";
pub const FENCE_CLOSE: &str = "```";

/// Remove a leading ```` ```json ```` fence and everything from the last
/// closing fence on. Text without the opening marker is returned trimmed.
pub fn strip_json_fence(text: &str) -> Result<&str> {
    let text = text.trim();
    let Some(rest) = text.strip_prefix(JSON_FENCE_OPEN) else {
        return Ok(text);
    };

    match rest.rfind(FENCE_CLOSE) {
        Some(end) => Ok(rest[..end].trim()),
        None => Err(RelayError::ResponseShape(
            "Model output opens a ```json fence but never closes it".into(),
        )),
    }
}

/// Parse structured-mode model output into JSON, without checking its schema.
pub fn parse_structured(text: &str) -> Result<Value> {
    let body = strip_json_fence(text)?;
    serde_json::from_str(body).map_err(|e| {
        RelayError::ResponseShape(format!("Model output is not valid JSON: {}", e))
    })
}
