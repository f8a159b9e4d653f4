//! Pipeline stages for mark-sheet extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. point at a different provider) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ parse
//! (path)    (base64)   (VLM call)  (JSON-span recovery)
//! ```
//!
//! 1. [`input`]   — load the uploaded image, gated by file extension
//! 2. [`encode`]  — base64-wrap the raw bytes and build the data URI for the
//!    multimodal API request body
//! 3. [`extract`] — drive the single provider call with an explicit timeout;
//!    the only stage with network I/O
//! 4. [`parse`]   — recover a JSON object from the possibly prose-wrapped
//!    reply text

pub mod encode;
pub mod extract;
pub mod input;
pub mod parse;
