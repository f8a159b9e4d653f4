//! Vision provider abstraction and the OpenAI-compatible implementation.
//!
//! The remote model sits behind the [`VisionProvider`] trait so the rest of
//! the pipeline never touches HTTP directly. Production uses
//! [`OpenAiCompatProvider`] (Groq speaks the OpenAI chat-completions wire
//! format); tests inject a canned implementation via
//! [`crate::config::ExtractionConfigBuilder::provider`]. There is no shared
//! process-wide client: every provider is an explicitly constructed value
//! owning its own `reqwest::Client`.

use crate::error::{ExtractionError, MarksheetError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One chat-style extraction request: a fixed text instruction plus exactly
/// one embedded image reference.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// The instruction prompt.
    pub prompt: String,
    /// `data:<mime>;base64,<text>` URI for the uploaded image.
    pub image_data_uri: String,
    /// Sampling temperature; 0 for deterministic decoding.
    pub temperature: f32,
    /// Maximum tokens the model may generate.
    pub max_tokens: u32,
}

/// The model's reply plus whatever usage accounting the API reported.
#[derive(Debug, Clone, Default)]
pub struct VisionReply {
    /// Raw assistant text; empty when the API returned no choices.
    pub content: String,
    /// Prompt tokens reported by the API (0 when not reported).
    pub prompt_tokens: u32,
    /// Completion tokens reported by the API (0 when not reported).
    pub completion_tokens: u32,
}

/// A vision-capable chat-completion backend.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind an
/// `Arc<dyn VisionProvider>` so callers can share one provider across
/// submissions or swap in a test double.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logs and error messages.
    fn name(&self) -> &str;

    /// Model identifier the provider will use.
    fn model(&self) -> &str;

    /// Issue one chat completion. Transport, authentication, quota, and
    /// malformed-response failures are all reported as
    /// [`ExtractionError::Transport`] with the underlying message.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionReply, ExtractionError>;
}

impl std::fmt::Debug for dyn VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProvider")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}

// ── OpenAI-compatible wire types ─────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ── Provider implementation ──────────────────────────────────────────────

/// Default chat-completions endpoint (Groq's OpenAI-compatible API).
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "llama-3.2-90b-vision-preview";

/// Chat-completions provider for any OpenAI-compatible endpoint.
pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatProvider {
    /// Build a provider for the given endpoint, key, and model.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, MarksheetError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| MarksheetError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Convenience constructor for Groq with the default vision model.
    pub fn groq(api_key: impl Into<String>) -> Result<Self, MarksheetError> {
        Self::new(GROQ_API_BASE, api_key, DEFAULT_MODEL)
    }

    fn build_body<'a>(&'a self, request: &'a VisionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &request.image_data_uri,
                        },
                    },
                ],
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl VisionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionReply, ExtractionError> {
        let body = self.build_body(request);

        let response = self
            .http
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ExtractionError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Transport {
                message: format!("HTTP {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(ExtractionError::transport)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = parsed.usage.unwrap_or_default();

        debug!(
            "Model reply: {} chars, {} prompt tokens, {} completion tokens",
            content.len(),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        Ok(VisionReply {
            content,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}
