//! Configuration for mark-sheet extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share a config across submissions and to diff two runs
//! to understand why their outputs differ.
//!
//! The provider is part of the config rather than process-global state:
//! callers construct it explicitly (or let [`crate::verify_marksheet`]
//! construct the default Groq provider from the key), which is what makes
//! test doubles possible.

use crate::error::MarksheetError;
use crate::provider::{VisionProvider, DEFAULT_MODEL, GROQ_API_BASE};
use std::fmt;
use std::sync::Arc;

/// Configuration for one or more mark-sheet extractions.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use marksheet_verify::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("gsk_...")
///     .model("llama-3.2-90b-vision-preview")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Chat-completions endpoint URL. Default: Groq's OpenAI-compatible API.
    pub api_base: String,

    /// Model identifier. Default: `llama-3.2-90b-vision-preview`.
    pub model: String,

    /// API key. If `None`, the `GROQ_API_KEY` environment variable is read
    /// when the default provider is constructed.
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Zero makes the model deterministic and faithful to what it sees on
    /// the document — exactly what you want for transcription. Any
    /// creativity only worsens extraction accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// Four short fields fit comfortably in far fewer tokens; the headroom
    /// covers models that pad the JSON with explanatory prose, which the
    /// parser then strips.
    pub max_tokens: u32,

    /// Timeout for the single provider call, in seconds. Default: 60.
    ///
    /// The call is the one blocking operation in the pipeline. An explicit
    /// bound here means a stuck network never wedges a submission forever;
    /// expiry surfaces as a transport error, like any other network failure.
    pub api_timeout_secs: u64,

    /// Custom instruction prompt. If `None`, uses
    /// [`crate::prompts::DEFAULT_EXTRACTION_PROMPT`].
    pub prompt: Option<String>,

    /// Pre-constructed provider. Takes precedence over `api_base` /
    /// `api_key` / `model`. This is the seam test doubles plug into.
    pub provider: Option<Arc<dyn VisionProvider>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_base: GROQ_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 1024,
            api_timeout_secs: 60,
            prompt: None,
            provider: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompt", &self.prompt)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn VisionProvider>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn VisionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, MarksheetError> {
        let c = &self.config;
        if c.api_base.trim().is_empty() {
            return Err(MarksheetError::InvalidConfig(
                "api_base must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(MarksheetError::InvalidConfig(
                "model must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
