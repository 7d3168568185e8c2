//! Crop-box geometry in display space.
//!
//! # Coordinate System
//!
//! - Display space: pixels as the current image is rendered on screen
//! - Native space: the decoded image's stored resolution
//! - Origin is the image's top-left corner in both spaces
//!
//! Every crop box handed out by this module satisfies
//! `0 <= x`, `0 <= y`, `x + width <= bounds.width`, `y + height <= bounds.height`
//! and `width, height >= min_size`. When the bounds themselves are smaller than
//! `min_size` on an axis, the box fills that axis.

mod engine;
mod viewport;

use serde::{Deserialize, Serialize};

pub use engine::CropEngine;
pub use viewport::{fit_to_viewport, ViewportEnvelope};

/// Smallest crop edge, in display pixels.
pub const MIN_CROP_SIZE: f64 = 50.0;

/// Size of the initial crop box placed on the first image of a session.
pub const DEFAULT_CROP_SIZE: CropSize = CropSize {
    width: 200.0,
    height: 150.0,
};

/// Width/height pair in floating-point pixels.
///
/// Used for displayed image bounds and for native sizes when scaling between
/// the two spaces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBounds {
    pub width: f64,
    pub height: f64,
}

impl ImageBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Bounds usable as clamp limits: non-finite or negative edges become 0.
    fn limits(self) -> (f64, f64) {
        (finite_or(self.width, 0.0).max(0.0), finite_or(self.height, 0.0).max(0.0))
    }
}

/// Requested crop dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CropSize {
    fn default() -> Self {
        DEFAULT_CROP_SIZE
    }
}

/// Pointer position in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Corner handle grabbed for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Handle {
    /// Parse the handle names used by the host UI (`"nw"`, `"ne"`, `"sw"`, `"se"`).
    pub fn parse(name: &str) -> Option<Handle> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nw" => Some(Handle::Nw),
            "ne" => Some(Handle::Ne),
            "sw" => Some(Handle::Sw),
            "se" => Some(Handle::Se),
            _ => None,
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::Sw)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne)
    }
}

/// Crop rectangle in display pixels, relative to the image's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box of `size` (shrunk to fit) centered in `bounds`.
    pub fn centered(bounds: ImageBounds, size: CropSize, min_size: f64) -> CropBox {
        let (max_w, max_h) = bounds.limits();
        let width = finite_or(size.width, min_size).min(max_w);
        let height = finite_or(size.height, min_size).min(max_h);
        CropBox::new((max_w - width) / 2.0, (max_h - height) / 2.0, width, height)
            .constrained(bounds, min_size)
    }

    /// Clamp this box into `bounds`: size first, then position.
    ///
    /// Never fails. Negative coordinates, oversized dimensions and non-finite
    /// values are all pulled back into a valid box. Idempotent.
    pub fn constrained(self, bounds: ImageBounds, min_size: f64) -> CropBox {
        let (max_w, max_h) = bounds.limits();
        let width = fit_extent(self.width, min_size, max_w);
        let height = fit_extent(self.height, min_size, max_h);
        CropBox {
            x: fit_offset(self.x, width, max_w),
            y: fit_offset(self.y, height, max_h),
            width,
            height,
        }
    }

    /// Translate by a pointer delta, then clamp.
    pub fn dragged(self, dx: f64, dy: f64, bounds: ImageBounds, min_size: f64) -> CropBox {
        CropBox {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
        .constrained(bounds, min_size)
    }

    /// Move the two edges adjacent to `handle` by a pointer delta, then clamp.
    ///
    /// The opposite edges stay fixed. A moved edge stops at the image border
    /// and at `min_size` from its opposite edge, so the box never inverts.
    pub fn resized(
        self,
        handle: Handle,
        dx: f64,
        dy: f64,
        bounds: ImageBounds,
        min_size: f64,
    ) -> CropBox {
        let (max_w, max_h) = bounds.limits();
        let (mut left, mut right) = (self.x, self.x + self.width);
        let (mut top, mut bottom) = (self.y, self.y + self.height);

        if handle.moves_left_edge() {
            left = (left + dx).min(right - min_size).max(0.0);
        } else {
            right = (right + dx).max(left + min_size).min(max_w);
        }

        if handle.moves_top_edge() {
            top = (top + dy).min(bottom - min_size).max(0.0);
        } else {
            bottom = (bottom + dy).max(top + min_size).min(max_h);
        }

        CropBox::new(left, top, right - left, bottom - top).constrained(bounds, min_size)
    }

    /// Scale to native pixel space. X and Y scale independently.
    ///
    /// Returns the box unchanged when `display` has a zero edge.
    pub fn to_native_rect(self, natural: ImageBounds, display: ImageBounds) -> NativeRect {
        let scale_x = axis_scale(natural.width, display.width);
        let scale_y = axis_scale(natural.height, display.height);
        NativeRect {
            x: self.x * scale_x,
            y: self.y * scale_y,
            width: self.width * scale_x,
            height: self.height * scale_y,
        }
    }

    /// Check the box invariant against `bounds`.
    pub fn fits(&self, bounds: ImageBounds, min_size: f64) -> bool {
        const EPS: f64 = 1e-9;
        let (max_w, max_h) = bounds.limits();
        let min_w = min_size.min(max_w);
        let min_h = min_size.min(max_h);
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= max_w + EPS
            && self.y + self.height <= max_h + EPS
            && self.width >= min_w - EPS
            && self.height >= min_h - EPS
    }
}

/// Crop rectangle in native pixel space, before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[inline]
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[inline]
fn fit_extent(value: f64, min_size: f64, limit: f64) -> f64 {
    finite_or(value, min_size).max(min_size).min(limit)
}

#[inline]
fn fit_offset(value: f64, extent: f64, limit: f64) -> f64 {
    finite_or(value, 0.0).min(limit - extent).max(0.0)
}

#[inline]
fn axis_scale(natural: f64, display: f64) -> f64 {
    if display > 0.0 && natural.is_finite() && display.is_finite() {
        natural / display
    } else {
        1.0
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
