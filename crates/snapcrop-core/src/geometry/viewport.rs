//! Display-equivalent bounds for images that are never rendered.
//!
//! The batch pipeline processes images the user never sees. To map the one
//! crop box (drawn on the image the user last saw) onto each of them, every
//! image gets the bounds it *would* have on screen: scaled down to fit the
//! viewport envelope, aspect ratio preserved, never scaled up.

use serde::{Deserialize, Serialize};

use super::ImageBounds;

/// Largest area an image may occupy on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportEnvelope {
    pub max_width: f64,
    pub max_height: f64,
}

impl ViewportEnvelope {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Derive the envelope from the host viewport and the share of it the
    /// editor gives to the image.
    pub fn from_viewport(
        viewport_width: f64,
        viewport_height: f64,
        width_ratio: f64,
        height_ratio: f64,
    ) -> Self {
        Self {
            max_width: (viewport_width * width_ratio).max(0.0),
            max_height: (viewport_height * height_ratio).max(0.0),
        }
    }
}

/// Fit a native image size into the envelope.
///
/// Pure function of its inputs, so batch geometry is testable without a
/// rendering surface. Degenerate sizes yield zero bounds.
pub fn fit_to_viewport(native: ImageBounds, envelope: ViewportEnvelope) -> ImageBounds {
    let (width, height) = native.limits();
    if width == 0.0 || height == 0.0 {
        return ImageBounds::default();
    }

    let scale = (envelope.max_width / width)
        .min(envelope.max_height / height)
        .min(1.0);
    if !scale.is_finite() || scale <= 0.0 {
        return ImageBounds::default();
    }

    ImageBounds::new(width * scale, height * scale)
}
