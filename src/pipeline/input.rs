//! Input loading: read an uploaded mark-sheet image from disk.
//!
//! ## Why an extension gate and nothing more?
//!
//! The accepted upload types are jpg, jpeg, and png, decided by file
//! extension alone — content is never sniffed. A mislabelled file sails
//! through here and fails at the model instead; the gate exists to reject
//! obviously wrong uploads (PDFs, text files) with a clear message before
//! any network traffic happens.

use crate::error::MarksheetError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Accepted image formats, decided by extension.
///
/// The kind also determines the MIME type declared in the data URI sent to
/// the model, so a PNG upload is labelled `image/png` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Map a file extension (case-insensitive) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// MIME type declared in the data URI.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }
}

/// An image read into memory, with its extension-derived kind.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
    pub path: PathBuf,
}

/// Load a mark-sheet image, validating existence and extension.
pub fn load_image(path: impl AsRef<Path>) -> Result<LoadedImage, MarksheetError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(MarksheetError::ImageNotFound { path });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();
    let kind = ImageKind::from_extension(&extension).ok_or_else(|| {
        MarksheetError::UnsupportedImageType {
            path: path.clone(),
            extension: extension.clone(),
        }
    })?;

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MarksheetError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(MarksheetError::ImageNotFound { path });
        }
    };

    debug!(
        "Loaded image: {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        kind.mime_type()
    );

    Ok(LoadedImage { bytes, kind, path })
}
