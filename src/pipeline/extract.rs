//! Model interaction: build the vision request, call the provider once.
//!
//! This module converts an encoded image into exactly one provider call and
//! returns the recovered record. It is intentionally thin — the prompt lives
//! in [`crate::prompts`], the wire format in [`crate::provider`], and the
//! reply recovery in [`crate::pipeline::parse`], so each can change without
//! touching the others.
//!
//! There is no retry loop: extraction is all-or-nothing per submission, and
//! any failure is handed back as a value for the caller to display.

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::parse;
use crate::provider::{VisionProvider, VisionRequest};
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use crate::record::{ExtractionStats, MarksheetRecord};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// One extraction round-trip: the outcome plus its accounting.
///
/// Always returned — a failed call carries the error as a value, never a
/// propagated fault, so the caller can render the message and move on.
#[derive(Debug)]
pub struct ExtractionAttempt {
    pub outcome: Result<MarksheetRecord, ExtractionError>,
    pub stats: ExtractionStats,
}

/// Send the encoded image to the model and recover the record.
///
/// ## Request layout
///
/// A single user message with two parts, in order:
/// 1. the fixed instruction prompt (or the configured override)
/// 2. the image as a `data:<mime>;base64,...` reference
///
/// Decoding is deterministic (`temperature`, default 0) and bounded
/// (`max_tokens`, default 1024). The whole call sits under an explicit
/// timeout from the config; expiry is reported as a transport error.
///
/// ## Reply handling
///
/// Blank or whitespace-only content → [`ExtractionError::EmptyResponse`];
/// anything else goes to [`parse::parse_response`] for JSON-span recovery.
pub async fn extract_fields(
    provider: &dyn VisionProvider,
    image: &EncodedImage,
    config: &ExtractionConfig,
) -> ExtractionAttempt {
    let start = Instant::now();

    let request = VisionRequest {
        prompt: config
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTRACTION_PROMPT.to_string()),
        image_data_uri: image.data_uri(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    debug!(
        "Requesting extraction from '{}' model '{}'",
        provider.name(),
        provider.model()
    );

    let call = provider.complete(&request);
    let reply = match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!("Extraction call failed: {e}");
            return attempt(Err(e), provider, start, 0, 0);
        }
        Err(_) => {
            let e = ExtractionError::Transport {
                message: format!("API call timed out after {}s", config.api_timeout_secs),
            };
            warn!("{e}");
            return attempt(Err(e), provider, start, 0, 0);
        }
    };

    let outcome = if reply.content.trim().is_empty() {
        Err(ExtractionError::EmptyResponse)
    } else {
        parse::parse_response(&reply.content)
    };

    if let Err(ref e) = outcome {
        warn!("Extraction failed: {e}");
    }

    attempt(
        outcome,
        provider,
        start,
        reply.prompt_tokens,
        reply.completion_tokens,
    )
}

fn attempt(
    outcome: Result<MarksheetRecord, ExtractionError>,
    provider: &dyn VisionProvider,
    start: Instant,
    prompt_tokens: u32,
    completion_tokens: u32,
) -> ExtractionAttempt {
    ExtractionAttempt {
        outcome,
        stats: ExtractionStats {
            model: provider.model().to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens,
            completion_tokens,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_image;
    use crate::pipeline::input::ImageKind;
    use crate::record::Field;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned provider capturing the request it was given.
    struct CannedProvider {
        reply: Result<String, ExtractionError>,
        seen: Mutex<Option<VisionRequest>>,
    }

    impl CannedProvider {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(content.to_string()),
                seen: Mutex::new(None),
            }
        }

        fn failing(error: ExtractionError) -> Self {
            Self {
                reply: Err(error),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl VisionProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-vision"
        }

        async fn complete(
            &self,
            request: &VisionRequest,
        ) -> Result<VisionReply, ExtractionError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            self.reply.clone().map(|content| VisionReply {
                content,
                prompt_tokens: 11,
                completion_tokens: 7,
            })
        }
    }

    use crate::provider::VisionReply;

    fn png_image() -> EncodedImage {
        encode_image(&[0x89, b'P', b'N', b'G'], ImageKind::Png)
    }

    #[tokio::test]
    async fn builds_prompt_plus_data_uri_request() {
        let provider = CannedProvider::replying(r#"{"Name": "A"}"#);
        let config = ExtractionConfig::default();

        let attempt = extract_fields(&provider, &png_image(), &config).await;
        let record = attempt.outcome.expect("should extract");
        assert_eq!(record.field_text(Field::Name).as_deref(), Some("A"));

        let seen = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.prompt, DEFAULT_EXTRACTION_PROMPT);
        assert!(seen.image_data_uri.starts_with("data:image/png;base64,"));
        assert_eq!(seen.temperature, 0.0);
        assert_eq!(seen.max_tokens, 1024);
    }

    #[tokio::test]
    async fn prompt_override_is_honoured() {
        let provider = CannedProvider::replying(r#"{"Name": "A"}"#);
        let config = ExtractionConfig::builder()
            .prompt("Just the name, as JSON.")
            .build()
            .unwrap();

        extract_fields(&provider, &png_image(), &config).await;
        let seen = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.prompt, "Just the name, as JSON.");
    }

    #[tokio::test]
    async fn blank_reply_is_empty_response() {
        let provider = CannedProvider::replying("   \n\t  ");
        let config = ExtractionConfig::default();

        let attempt = extract_fields(&provider, &png_image(), &config).await;
        assert_eq!(attempt.outcome.unwrap_err(), ExtractionError::EmptyResponse);
        // Usage is still recorded for a blank reply.
        assert_eq!(attempt.stats.prompt_tokens, 11);
    }

    #[tokio::test]
    async fn transport_failure_passes_through_with_message() {
        let provider = CannedProvider::failing(ExtractionError::transport("401 Unauthorized"));
        let config = ExtractionConfig::default();

        let attempt = extract_fields(&provider, &png_image(), &config).await;
        let err = attempt.outcome.unwrap_err();
        assert_eq!(err.to_string(), "401 Unauthorized");
        assert_eq!(attempt.stats.model, "canned-vision");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_hits_the_configured_timeout() {
        struct StalledProvider;

        #[async_trait]
        impl VisionProvider for StalledProvider {
            fn name(&self) -> &str {
                "stalled"
            }
            fn model(&self) -> &str {
                "stalled"
            }
            async fn complete(
                &self,
                _request: &VisionRequest,
            ) -> Result<VisionReply, ExtractionError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(VisionReply::default())
            }
        }

        let config = ExtractionConfig::builder()
            .api_timeout_secs(1)
            .build()
            .unwrap();

        // Paused clock auto-advances while every task is idle, so the
        // one-hour stall and the one-second timeout both elapse instantly.
        let attempt = extract_fields(&StalledProvider, &png_image(), &config).await;

        let err = attempt.outcome.unwrap_err();
        assert!(
            err.to_string().contains("timed out"),
            "expected timeout, got: {err}"
        );
    }
}
