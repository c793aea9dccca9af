//! Pulls the JSON document out of a model answer.

use thiserror::Error;

const FENCE_OPEN: &str = "```json\n";
const FENCE_CLOSE: &str = "\n```";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no JSON object found in the model output")]
pub struct ExtractionError;

/// Prefer a fenced ```json block, else the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Result<&str, ExtractionError> {
    if let Some(start) = text.find(FENCE_OPEN) {
        let body = &text[start + FENCE_OPEN.len()..];
        if let Some(end) = body.find(FENCE_CLOSE) {
            return Ok(&body[..end]);
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(ExtractionError),
    }
}
