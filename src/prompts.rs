//! The fixed instruction prompt sent with every mark-sheet image.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON keys the model is told to emit
//!    must stay in lock-step with [`crate::record::Field`]; there is exactly
//!    one place where they are spelled out to the model.
//!
//! 2. **Testability** — unit tests can assert the prompt names every field
//!    without spinning up a real model.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::prompt`]; the constant here is used
//! only when no override is provided.

/// Default instruction prompt for extracting mark-sheet fields.
///
/// The model is told to answer strictly in JSON with the exact four keys the
/// comparator reads. Anything else in the reply (prose, markdown fences) is
/// tolerated by the parser's JSON-span recovery, but the prompt asks for
/// JSON only to keep recovery trivial.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Extract details from the provided mark sheet with 100% accuracy.
Do not assume or hallucinate any data. Maintain structured output as follows:

**Student Information:**
- Candidate Name:
- Roll No.:
- Examination Year:

**Final Status:**
- Result: [Pass/Fail]

Extract only the exact details as they appear on the document.
Output the response strictly in JSON format:
{"Name": "value", "Roll No.": "value", "Examination Year": "value", "Result": "value"}"#;
