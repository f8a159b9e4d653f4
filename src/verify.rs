//! Top-level entry points: extract a record, or extract and compare.
//!
//! Everything here is one linear pass per submission: load → encode → call
//! the model → parse → compare. Nothing is cached or persisted; every
//! submission builds its values fresh and the caller discards them after
//! rendering.
//!
//! Fatal problems (missing file, bad extension, no API key) come back as
//! `Err(MarksheetError)`. Everything the remote model can do wrong comes
//! back as `Ok` with a failed [`ExtractionOutcome`] — callers display the
//! message and skip the comparison; a failed extraction never produces a
//! partial table.

use crate::compare;
use crate::config::ExtractionConfig;
use crate::error::MarksheetError;
use crate::pipeline::input::ImageKind;
use crate::pipeline::{encode, extract, input};
use crate::provider::{OpenAiCompatProvider, VisionProvider};
use crate::record::{ExtractionOutput, ManualEntry, VerificationOutput};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Extract the four mark-sheet fields from an image file.
///
/// # Arguments
/// * `image_path` — path to a jpg/jpeg/png photograph of the mark sheet
/// * `config`     — extraction configuration
///
/// # Errors
/// Returns `Err(MarksheetError)` only for fatal errors (file not found,
/// unsupported extension, missing API key). Model-side failures are reported
/// inside the returned [`ExtractionOutput`].
pub async fn extract_marksheet(
    image_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, MarksheetError> {
    let image = input::load_image(image_path)?;
    info!("Extracting fields from {}", image.path.display());
    extract_from_bytes(&image.bytes, image.kind, config).await
}

/// Extract the four mark-sheet fields from an in-memory image buffer.
///
/// This is the entry point for callers holding an uploaded buffer rather
/// than a file on disk; the extension gate is the caller's responsibility
/// and `kind` states which accepted format the buffer holds.
pub async fn extract_from_bytes(
    bytes: &[u8],
    kind: ImageKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, MarksheetError> {
    let provider = resolve_provider(config)?;
    let encoded = encode::encode_image(bytes, kind);

    let attempt = extract::extract_fields(provider.as_ref(), &encoded, config).await;

    info!(
        "Extraction {} in {}ms",
        if attempt.outcome.is_ok() { "succeeded" } else { "failed" },
        attempt.stats.duration_ms
    );

    Ok(ExtractionOutput {
        outcome: attempt.outcome.into(),
        stats: attempt.stats,
    })
}

/// Extract from an image file and compare against the manual entry.
///
/// This is the primary entry point for the library. When extraction
/// succeeds, `rows` holds exactly four [`crate::record::ComparisonRow`]s in
/// fixed field order; when it fails, `rows` is `None` and the outcome
/// carries the error to display.
pub async fn verify_marksheet(
    image_path: impl AsRef<Path>,
    manual: &ManualEntry,
    config: &ExtractionConfig,
) -> Result<VerificationOutput, MarksheetError> {
    let extraction = extract_marksheet(image_path, config).await?;
    Ok(compare_outcome(extraction, manual))
}

/// In-memory counterpart of [`verify_marksheet`].
pub async fn verify_from_bytes(
    bytes: &[u8],
    kind: ImageKind,
    manual: &ManualEntry,
    config: &ExtractionConfig,
) -> Result<VerificationOutput, MarksheetError> {
    let extraction = extract_from_bytes(bytes, kind, config).await?;
    Ok(compare_outcome(extraction, manual))
}

/// Synchronous wrapper around [`verify_marksheet`].
///
/// Creates a temporary tokio runtime internally.
pub fn verify_sync(
    image_path: impl AsRef<Path>,
    manual: &ManualEntry,
    config: &ExtractionConfig,
) -> Result<VerificationOutput, MarksheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MarksheetError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(verify_marksheet(image_path, manual, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn compare_outcome(extraction: ExtractionOutput, manual: &ManualEntry) -> VerificationOutput {
    let rows = extraction
        .outcome
        .record()
        .map(|record| compare::compare(manual, record));

    VerificationOutput {
        outcome: extraction.outcome,
        rows,
        stats: extraction.stats,
    }
}

/// Resolve the provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured it entirely; used as-is. This is how tests inject a
///    double and how callers add middleware.
///
/// 2. **Config key** (`config.api_key`) — an OpenAI-compatible provider is
///    built for the configured endpoint and model.
///
/// 3. **Environment** (`GROQ_API_KEY`) — the conventional variable for the
///    default Groq endpoint.
///
/// A missing key is a fatal configuration error raised before any network
/// traffic, not a transport failure discovered mid-call.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn VisionProvider>, MarksheetError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let api_key = match config.api_key.clone() {
        Some(key) if !key.is_empty() => key,
        _ => match std::env::var("GROQ_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                return Err(MarksheetError::MissingApiKey {
                    provider: "openai-compat".to_string(),
                })
            }
        },
    };

    let provider = OpenAiCompatProvider::new(&config.api_base, api_key, &config.model)?;
    Ok(Arc::new(provider))
}
