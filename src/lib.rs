//! # marksheet-verify
//!
//! Validate manually entered mark-sheet fields against a photographed mark
//! sheet using a Vision Language Model (VLM).
//!
//! ## Why this crate?
//!
//! Transcribing printed academic mark sheets by hand is error-prone, and
//! classic OCR struggles with the stamps, rules, and mixed typefaces on
//! these documents. Instead this crate lets a VLM read the photograph as a
//! human would, then compares the extracted fields against the values the
//! user typed in — surfacing exactly which fields disagree.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image (jpg/jpeg/png)
//!  │
//!  ├─ 1. Input    extension-gated load of the uploaded photograph
//!  ├─ 2. Encode   bytes → base64 data URI (MIME from the actual format)
//!  ├─ 3. Extract  one chat-completion call, temperature 0, fixed prompt
//!  ├─ 4. Parse    greedy {…} span recovery from the free-text reply
//!  └─ 5. Compare  trim + case-fold against the manual entry, 4 rows out
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marksheet_verify::{verify_marksheet, ExtractionConfig, ManualEntry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GROQ_API_KEY
//!     let config = ExtractionConfig::default();
//!     let manual = ManualEntry {
//!         name: "John Doe".into(),
//!         roll_no: "12".into(),
//!         examination_year: "2021".into(),
//!         result: "Pass".into(),
//!     };
//!
//!     let output = verify_marksheet("marksheet.jpg", &manual, &config).await?;
//!     match output.rows {
//!         Some(rows) => {
//!             for row in rows {
//!                 println!("{}: {}", row.field, row.verdict);
//!             }
//!         }
//!         None => eprintln!("Error: {}", output.outcome.error().unwrap()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mkverify` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! marksheet-verify = { version = "0.1", default-features = false }
//! ```
//!
//! ## Reliability model
//!
//! The remote model is the only untrusted collaborator. Everything it can do
//! wrong — network failures, blank replies, prose-wrapped or malformed JSON,
//! renamed or missing keys — is caught at the extraction boundary and
//! reported as an [`ExtractionError`] value inside the outcome. The
//! comparison only ever runs on a successfully recovered record; there is no
//! retry, no partial table, and no fault that escapes to the caller.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compare;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod record;
pub mod verify;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compare::{compare, NOT_PROVIDED};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractionError, MarksheetError};
pub use pipeline::encode::{encode_image, EncodedImage};
pub use pipeline::input::{load_image, ImageKind, LoadedImage};
pub use pipeline::parse::parse_response;
pub use provider::{OpenAiCompatProvider, VisionProvider, VisionReply, VisionRequest};
pub use record::{
    ComparisonRow, ExtractionOutcome, ExtractionOutput, ExtractionStats, Field, ManualEntry,
    MarksheetRecord, MatchVerdict, VerificationOutput,
};
pub use verify::{
    extract_from_bytes, extract_marksheet, verify_from_bytes, verify_marksheet, verify_sync,
};
