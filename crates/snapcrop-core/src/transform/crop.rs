//! Pixel-grid cropping.
//!
//! The native rectangle coming out of display→native scaling is fractional
//! and can overshoot the image by a rounding error. [`PixelRect::from_native`]
//! snaps it to whole pixels inside the source; [`crop_pixels`] copies it out.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;
use crate::geometry::NativeRect;

/// Crop region on the source's pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// The whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Snap a native rectangle to the pixel grid of a `src_width` × `src_height`
    /// image.
    ///
    /// # Behavior
    ///
    /// - Negative or non-finite coordinates clamp to 0
    /// - The region never extends past the image
    /// - Minimum output dimension is 1x1 pixels
    pub fn from_native(rect: NativeRect, src_width: u32, src_height: u32) -> Self {
        let px_left = snap(rect.x).min(src_width.saturating_sub(1));
        let px_top = snap(rect.y).min(src_height.saturating_sub(1));
        let px_right = px_left.saturating_add(snap(rect.width)).min(src_width);
        let px_bottom = px_top.saturating_add(snap(rect.height)).min(src_height);

        Self {
            x: px_left,
            y: px_top,
            width: px_right.saturating_sub(px_left).max(1),
            height: px_bottom.saturating_sub(px_top).max(1),
        }
    }

    /// True when the rectangle covers a `width` × `height` image exactly.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// Round to a whole pixel; `as` saturates NaN and negatives to 0.
#[inline]
fn snap(value: f64) -> u32 {
    value.round() as u32
}

/// Copy `rect` out of `image`.
///
/// `rect` must lie inside the image (as produced by [`PixelRect::from_native`]);
/// anything outside is clipped.
pub fn crop_pixels(image: &DecodedImage, rect: PixelRect) -> DecodedImage {
    if rect.covers(image.width, image.height) {
        return image.clone();
    }

    let x0 = rect.x.min(image.width) as usize;
    let y0 = rect.y.min(image.height) as usize;
    let out_width = (rect.width as usize).min(image.width as usize - x0);
    let out_height = (rect.height as usize).min(image.height as usize - y0);

    let src_stride = image.width as usize * 3;
    let row_bytes = out_width * 3;
    let mut output = Vec::with_capacity(row_bytes * out_height);

    for y in y0..y0 + out_height {
        let start = y * src_stride + x0 * 3;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    DecodedImage {
        width: out_width as u32,
        height: out_height as u32,
        pixels: output,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..width * height)
            .flat_map(|i| {
                let v = (i % 256) as u8;
                [v, v, v]
            })
            .collect();
        DecodedImage::new(width, height, pixels)
    }

    proptest! {
        /// Property: snapped rects always lie inside the image and are non-empty.
        #[test]
        fn prop_snapped_rect_inside_image(
            (width, height) in (1u32..=400, 1u32..=400),
            (x, y, w, h) in (-100.0f64..=500.0, -100.0f64..=500.0, -100.0f64..=800.0, -100.0f64..=800.0),
        ) {
            let rect = PixelRect::from_native(NativeRect { x, y, width: w, height: h }, width, height);
            prop_assert!(rect.width >= 1 && rect.height >= 1);
            prop_assert!(rect.x + rect.width <= width);
            prop_assert!(rect.y + rect.height <= height);
        }

        /// Property: cropped output matches the rect and its buffer length.
        #[test]
        fn prop_crop_output_matches_rect(
            (width, height) in (4u32..=60, 4u32..=60),
            (x, y, w, h) in (0.0f64..=70.0, 0.0f64..=70.0, 0.0f64..=70.0, 0.0f64..=70.0),
        ) {
            let img = create_test_image(width, height);
            let rect = PixelRect::from_native(NativeRect { x, y, width: w, height: h }, width, height);
            let out = crop_pixels(&img, rect);

            prop_assert_eq!(out.width, rect.width);
            prop_assert_eq!(out.height, rect.height);
            prop_assert_eq!(out.pixels.len(), (out.width * out.height * 3) as usize);

            let src_idx = ((rect.y * width + rect.x) * 3) as usize;
            prop_assert_eq!(out.pixels[0], img.pixels[src_idx]);
        }
    }
}
