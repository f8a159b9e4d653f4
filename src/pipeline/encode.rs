//! Image encoding: raw bytes → base64 data URI.
//!
//! VLM APIs accept images as base64 data URIs embedded in the JSON request
//! body. Standard base64 with padding and no line wrapping is used, so an
//! external decoder recovers the original bytes exactly. The MIME type in
//! the URI is derived from the upload's [`ImageKind`] rather than hardcoded
//! to JPEG — the label must describe the bytes actually attached.

use crate::pipeline::input::ImageKind;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A base64-encoded image ready for the request body.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Standard base64 text, padded, no line wrapping.
    pub base64: String,
    pub kind: ImageKind,
}

impl EncodedImage {
    /// The `data:` URI embedded in the image part of the chat request.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.kind.mime_type(), self.base64)
    }
}

/// Encode raw image bytes for transport.
pub fn encode_image(bytes: &[u8], kind: ImageKind) -> EncodedImage {
    let base64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", base64.len());
    EncodedImage { base64, kind }
}
