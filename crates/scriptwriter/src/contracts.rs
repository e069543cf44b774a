//! Structured model response contract and validation.
//!
//! Every continuation step must produce a response that parses into
//! `ContinuationResult` before the loop consumes it. Malformed responses are
//! rejected (fail-closed); there is no defaulting of missing fields.
//!
//! ```text
//! ContinuationResult {
//!     continuation:         String,  // new script text
//!     continuation_summary: String,  // brief digest of that text
//!     completed:            bool,    // model thinks the budget is used up
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// One step's response from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContinuationResult {
    /// The newly written continuation of the script.
    pub continuation: String,
    /// A brief summary of the newly written continuation.
    pub continuation_summary: String,
    /// Whether this is the last step in the script writing process and is
    /// somewhat close to the total word limit.
    pub completed: bool,
}

/// Used only if schema serialization somehow fails.
const FALLBACK_SCHEMA: &str = r#"{
  "continuation": "The newly written continuation of the script",
  "continuation_summary": "A brief summary of the newly written continuation",
  "completed": "Whether this is the last step in the script writing process and is somewhat close to the total word limit"
}"#;

/// JSON schema of `ContinuationResult`, pretty-printed for the preamble.
pub fn continuation_schema() -> String {
    let schema = schemars::schema_for!(ContinuationResult);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| FALLBACK_SCHEMA.to_string())
}

/// Parse a raw model reply into a `ContinuationResult`.
///
/// The JSON object may be wrapped in prose or a ```json fence; anything else
/// (missing field, wrong type, unknown field) is a `SchemaValidation` error.
pub fn parse_continuation(raw: &str) -> Result<ContinuationResult, GenerationError> {
    let json_str = extract_json_block(raw)
        .ok_or_else(|| GenerationError::schema("response contains no JSON object", raw))?;

    serde_json::from_str::<ContinuationResult>(json_str)
        .map_err(|e| GenerationError::schema(e.to_string(), raw))
}

/// Try to extract a JSON block from a response that may contain surrounding text.
fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
