//! Produced images and the append-only collector that owns them.

use serde::Serialize;

use crate::encode::OutputFormat;

/// Prefix added to the upload's name for the suggested download name.
pub const DOWNLOAD_PREFIX: &str = "cropped_";

/// One encoded crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputImage {
    /// Encoded file bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Name of the upload this was produced from.
    pub original_name: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl OutputImage {
    /// Suggested file name for saving this output.
    pub fn download_name(&self) -> String {
        format!("{DOWNLOAD_PREFIX}{}", self.original_name)
    }
}

/// An image that produced no output, kept so the host can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedImage {
    /// Position in the uploaded sequence.
    pub index: usize,
    pub original_name: String,
    pub reason: String,
}

/// A file ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem<'a> {
    pub file_name: String,
    pub bytes: &'a [u8],
    pub mime_type: &'static str,
}

/// Append-only list of outputs for the session. No dedup, no overwrite;
/// order is the order images were confirmed or batch-processed in.
#[derive(Debug, Clone, Default)]
pub struct OutputCollector {
    items: Vec<OutputImage>,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: OutputImage) {
        self.items.push(image);
    }

    pub fn extend(&mut self, images: impl IntoIterator<Item = OutputImage>) {
        for image in images {
            self.push(image);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OutputImage> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputImage> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[OutputImage] {
        &self.items
    }

    /// Every output paired with its download name, in order.
    pub fn exports(&self) -> impl Iterator<Item = ExportItem<'_>> {
        self.items.iter().map(|image| ExportItem {
            file_name: image.download_name(),
            bytes: &image.data,
            mime_type: image.format.mime_type(),
        })
    }
}
