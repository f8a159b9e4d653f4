//! Response parsing: recover a JSON object from free-form reply text.
//!
//! ## Why a regex and not a JSON parser?
//!
//! The model is instructed to answer strictly in JSON, but in practice it
//! wraps the object in prose ("Here is the extracted data: {...} Let me
//! know..."), markdown fences, or trailing commentary. The recovery
//! heuristic takes the span from the **first `{` to the last `}`** in the
//! text — a greedy match, not a balanced-brace scan.
//!
//! Known limitation, kept deliberately: if the reply contains multiple
//! independent JSON objects, or literal braces in surrounding prose, the
//! greedy span covers all of them and the parse fails with
//! [`ExtractionError::InvalidJson`] instead of picking one object. That is
//! an acceptable failure mode for a single-object contract and keeps the
//! recovery rule trivially predictable.

use crate::error::ExtractionError;
use crate::record::MarksheetRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Recover the mark-sheet record from raw reply text.
///
/// - No `{...}` span at all → [`ExtractionError::NoJsonFound`]
/// - Span present but not well-formed JSON → [`ExtractionError::InvalidJson`]
/// - Otherwise the parsed mapping is returned as-is: no key validation and
///   no type coercion. Downstream consumers handle missing keys.
pub fn parse_response(text: &str) -> Result<MarksheetRecord, ExtractionError> {
    let span = RE_JSON_SPAN
        .find(text)
        .ok_or(ExtractionError::NoJsonFound)?;

    debug!(
        "Recovered {}-byte JSON span from {}-byte reply",
        span.as_str().len(),
        text.len()
    );

    match serde_json::from_str::<serde_json::Value>(span.as_str()) {
        Ok(serde_json::Value::Object(map)) => Ok(MarksheetRecord::new(map)),
        // The span starts with '{' and ends with '}', so any successful parse
        // is an object; anything else means the span was not valid JSON.
        Ok(_) | Err(_) => Err(ExtractionError::InvalidJson),
    }
}
