//! Single-image transform application: crop, then color effect.
//!
//! # Transform Order
//!
//! 1. Scale the display-space crop box to native pixels (see `geometry`)
//! 2. Round and clamp to the source's pixel grid
//! 3. Copy the region out of the source
//! 4. Apply the color effect to the copied region only
//! 5. Encode to the configured output format

mod apply;
mod crop;

pub use apply::{apply_transform, rasterize, RasterSettings, TransformError, TransformRequest};
pub use crop::{crop_pixels, PixelRect};
