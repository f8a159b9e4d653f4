//! Error types for the marksheet-verify library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MarksheetError`] — **Fatal**: the submission cannot be processed at
//!   all (missing image file, unsupported upload type, no API key). Returned
//!   as `Err(MarksheetError)` from the top-level `verify*`/`extract*`
//!   functions.
//!
//! * [`ExtractionError`] — **Expected unreliability**: the remote model call
//!   or its reply went wrong (network failure, blank reply, no JSON span,
//!   malformed JSON). Stored inside [`crate::record::ExtractionOutcome`]
//!   so callers render the message instead of a comparison table.
//!
//! The separation mirrors the trust boundary: everything up to the network is
//! under our control and fails loudly; everything past it is best-effort and
//! is reported as a value, never as a panic or an escaping fault.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the marksheet-verify library.
///
/// Model-side failures use [`ExtractionError`] and are stored in
/// [`crate::record::ExtractionOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum MarksheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Mark-sheet image was not found at the given path.
    #[error("Mark-sheet image not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the image file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of the accepted upload types.
    ///
    /// The gate is extension-based only; file content is never sniffed.
    #[error("Unsupported image type '{extension}' for '{path}'\nAccepted types: jpg, jpeg, png")]
    UnsupportedImageType { path: PathBuf, extension: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API key available from the config or the environment.
    #[error(
        "No API key configured for provider '{provider}'.\n\
         Set GROQ_API_KEY, or pass a key via ExtractionConfig::builder().api_key(..)."
    )]
    MissingApiKey { provider: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure of the extraction round-trip, reported as a value.
///
/// This is the full taxonomy of "the model did not give us a record":
/// the caller displays the [`Display`](std::fmt::Display) output and skips
/// the comparison entirely. There is no retry and no partial-success state —
/// extraction is all-or-nothing per submission.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionError {
    /// Network, authentication, quota, or malformed-response failure calling
    /// the remote model. The message is the underlying error text, verbatim.
    #[error("{message}")]
    Transport { message: String },

    /// The model returned blank or whitespace-only content.
    #[error("Empty response from API")]
    EmptyResponse,

    /// No `{...}` span present anywhere in the reply text.
    #[error("No valid JSON found in response")]
    NoJsonFound,

    /// A `{...}` span was found but does not parse as JSON.
    #[error("Invalid JSON format")]
    InvalidJson,
}

impl ExtractionError {
    /// Wrap an arbitrary transport-layer error, keeping its message.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ExtractionError::Transport {
            message: err.to_string(),
        }
    }
}
