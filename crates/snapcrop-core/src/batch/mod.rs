//! Batch pipeline: replay one crop/filter across every remaining image.
//!
//! The pipeline is host-agnostic. It awaits an [`ImageLoader`] for each
//! source and a [`Pacer`] between images; those two awaits are its only
//! suspension points. Futures are not required to be `Send`, so a browser
//! host can back both with JS promises.

mod pipeline;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decode::{DecodeError, DecodedImage};
use crate::filter::EffectSpec;
use crate::geometry::{CropBox, ViewportEnvelope};
use crate::output::{OutputImage, SkippedImage};
use crate::transform::RasterSettings;
use crate::upload::UploadedImage;

pub use pipeline::run_batch;

/// Which stages a batch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    CropOnly,
    FilterOnly,
    Both,
}

impl BatchMode {
    /// `(apply_crop, apply_filter)`.
    pub fn stages(self) -> (bool, bool) {
        match self {
            BatchMode::CropOnly => (true, false),
            BatchMode::FilterOnly => (false, true),
            BatchMode::Both => (true, true),
        }
    }

    pub fn parse(name: &str) -> Option<BatchMode> {
        match name {
            "crop-only" | "crop" => Some(BatchMode::CropOnly),
            "filter-only" | "filter" => Some(BatchMode::FilterOnly),
            "both" => Some(BatchMode::Both),
            _ => None,
        }
    }
}

/// Everything a batch run needs, detached from the session that built it.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Sequence index of `images[0]`.
    pub start_index: usize,
    pub images: Vec<UploadedImage>,
    /// Crop box as last seen on screen, in display space.
    pub crop_box: CropBox,
    pub min_crop_size: f64,
    pub effect: EffectSpec,
    pub mode: BatchMode,
    pub envelope: ViewportEnvelope,
    /// Pause between consecutive images.
    pub pacing: Duration,
    pub output: RasterSettings,
}

/// Batch position; `current` counts attempted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
}

/// Result of a completed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Produced images, in input order.
    pub outputs: Vec<OutputImage>,
    pub skipped: Vec<SkippedImage>,
    pub attempted: usize,
    pub total: usize,
}

/// Counts from a finished batch, for hosts that only need the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub produced: usize,
    pub skipped: usize,
    pub attempted: usize,
    pub total: usize,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            produced: self.outputs.len(),
            skipped: self.skipped.len(),
            attempted: self.attempted,
            total: self.total,
        }
    }
}

/// Fetches and decodes one source image.
#[allow(async_fn_in_trait)]
pub trait ImageLoader {
    async fn load(&self, image: &UploadedImage) -> Result<DecodedImage, DecodeError>;
}

/// Yields to the host between images.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&self, duration: Duration);
}

/// Pacer that never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    async fn pause(&self, _duration: Duration) {}
}

/// Receives batch events as they happen. All methods default to no-ops.
pub trait BatchObserver {
    /// An image was attempted (produced or skipped).
    fn on_progress(&self, _progress: BatchProgress) {}

    /// An image produced no output.
    fn on_skipped(&self, _skipped: &SkippedImage) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl BatchObserver for NoOpObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_stages() {
        assert_eq!(BatchMode::CropOnly.stages(), (true, false));
        assert_eq!(BatchMode::FilterOnly.stages(), (false, true));
        assert_eq!(BatchMode::Both.stages(), (true, true));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(BatchMode::parse("crop-only"), Some(BatchMode::CropOnly));
        assert_eq!(BatchMode::parse("filter"), Some(BatchMode::FilterOnly));
        assert_eq!(BatchMode::parse("both"), Some(BatchMode::Both));
        assert_eq!(BatchMode::parse("everything"), None);
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::to_string(&BatchMode::CropOnly).unwrap(),
            "\"crop-only\""
        );
    }

    #[test]
    fn test_summary() {
        let report = BatchReport {
            outputs: Vec::new(),
            skipped: vec![SkippedImage {
                index: 1,
                original_name: "x.jpg".into(),
                reason: "Decode failed".into(),
            }],
            attempted: 2,
            total: 2,
        };
        assert_eq!(
            report.summary(),
            BatchSummary {
                produced: 0,
                skipped: 1,
                attempted: 2,
                total: 2
            }
        );
    }
}
