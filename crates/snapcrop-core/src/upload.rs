//! Upload transport contract.
//!
//! The transport receives files, stores them and answers with a JSON manifest:
//!
//! ```text
//! { "success": true, "message": "...",
//!   "files": [{ "filename", "originalName", "url", "size", "mimetype" }] }
//! ```
//!
//! The editor only consumes that manifest; it never touches storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Files larger than this are rejected by the transport.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Files accepted per upload request.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Errors reading an upload manifest.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid upload manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),

    /// The transport reported failure.
    #[error("Upload failed: {0}")]
    Rejected(String),
}

/// One uploaded image, as served back by the transport.
///
/// Immutable once received; its identity is its position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub original_name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(alias = "mimetype")]
    pub mime_type: String,
}

impl UploadedImage {
    pub fn new(url: impl Into<String>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let mime_type = guess_mime_type(&original_name).to_string();
        Self {
            url: url.into(),
            original_name,
            size: 0,
            mime_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn guess_mime_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Limits enforced on the uploaded set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_file_size: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Stored-file entry in the transport's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Storage name assigned by the transport.
    #[serde(default)]
    pub filename: String,
    #[serde(flatten)]
    pub image: UploadedImage,
}

/// The transport's response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadManifest {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub files: Vec<UploadedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadManifest {
    pub fn from_json(json: &str) -> Result<Self, UploadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The editor's input sequence.
    ///
    /// Non-image and oversized entries are dropped and anything past
    /// `limits.max_files` is cut, each with a warning; order is preserved.
    pub fn into_images(self, limits: &UploadLimits) -> Result<Vec<UploadedImage>, UploadError> {
        if !self.success {
            let reason = self.error.unwrap_or(self.message);
            return Err(UploadError::Rejected(reason));
        }

        Ok(accept_images(
            self.files.into_iter().map(|f| f.image),
            limits,
        ))
    }
}

/// Filter a sequence of uploads against `limits`, keeping order.
pub fn accept_images(
    images: impl IntoIterator<Item = UploadedImage>,
    limits: &UploadLimits,
) -> Vec<UploadedImage> {
    let mut accepted = Vec::new();
    for image in images {
        if !image.is_image() {
            warn!(name = %image.original_name, mime = %image.mime_type, "Skipping non-image upload");
            continue;
        }
        if image.size > limits.max_file_size {
            warn!(
                name = %image.original_name,
                size = image.size,
                limit = limits.max_file_size,
                "Skipping oversized upload"
            );
            continue;
        }
        if accepted.len() == limits.max_files {
            warn!(name = %image.original_name, limit = limits.max_files, "Upload file limit reached");
            continue;
        }
        accepted.push(image);
    }
    accepted
}
