//! Rasterize one image's crop + filter into a standalone output.

use thiserror::Error;

use super::crop::{crop_pixels, PixelRect};
use crate::decode::{DecodeError, DecodedImage};
use crate::encode::{self, EncodeError, OutputFormat};
use crate::filter::EffectSpec;
use crate::geometry::NativeRect;
use crate::output::OutputImage;

/// Why a single image produced no output. Always recoverable: the caller
/// skips the image and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The raster surface has no pixel data (not decoded yet, or empty).
    #[error("Image surface unavailable: not decoded yet")]
    SurfaceUnavailable,

    /// A crop was requested but the image was never laid out on screen, so
    /// the display-space crop box cannot be mapped.
    #[error("Image has not been displayed; crop region unknown")]
    NotDisplayed,

    /// The source could not be loaded or decoded.
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The cropped pixels could not be encoded.
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
}

/// What to do to one image.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    /// Crop region in the source's native pixels.
    pub crop: NativeRect,
    pub effect: &'a EffectSpec,
    /// When false the whole source is kept and `crop` is ignored.
    pub apply_crop: bool,
    /// When false (or the effect is identity) colors are left untouched.
    pub apply_filter: bool,
}

/// Output encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSettings {
    pub format: OutputFormat,
    /// JPEG quality (1-100), ignored for PNG.
    pub quality: u8,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 92,
        }
    }
}

/// Crop and filter `source` into a new image sized to the clamped crop.
///
/// # Errors
///
/// `TransformError::SurfaceUnavailable` if `source` holds no pixel data.
pub fn apply_transform(
    source: &DecodedImage,
    request: &TransformRequest<'_>,
) -> Result<DecodedImage, TransformError> {
    if source.is_empty() {
        return Err(TransformError::SurfaceUnavailable);
    }

    let rect = if request.apply_crop {
        PixelRect::from_native(request.crop, source.width, source.height)
    } else {
        PixelRect::full(source.width, source.height)
    };

    let mut output = crop_pixels(source, rect);

    if request.apply_filter && !request.effect.is_identity() {
        request.effect.apply(&mut output.pixels);
    }

    Ok(output)
}

/// [`apply_transform`], then encode into an [`OutputImage`] named after
/// the source upload.
pub fn rasterize(
    source: &DecodedImage,
    original_name: &str,
    request: &TransformRequest<'_>,
    settings: RasterSettings,
) -> Result<OutputImage, TransformError> {
    let image = apply_transform(source, request)?;
    let data = encode::encode(
        &image.pixels,
        image.width,
        image.height,
        settings.format,
        settings.quality,
    )?;

    Ok(OutputImage {
        data,
        original_name: original_name.to_string(),
        width: image.width,
        height: image.height,
        format: settings.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{effect_of, EffectOp};

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 200]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn rect(x: f64, y: f64, width: f64, height: f64) -> NativeRect {
        NativeRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_no_crop_no_filter_keeps_native_size() {
        let src = gradient(640, 480);
        let identity = EffectSpec::identity();
        let out = apply_transform(
            &src,
            &TransformRequest {
                crop: rect(10.0, 10.0, 20.0, 20.0),
                effect: &identity,
                apply_crop: false,
                apply_filter: false,
            },
        )
        .unwrap();
        assert_eq!((out.width, out.height), (640, 480));
        assert_eq!(out, src);
    }

    #[test]
    fn test_crop_only_keeps_colors() {
        let src = gradient(300, 300);
        let out = apply_transform(
            &src,
            &TransformRequest {
                crop: rect(50.0, 75.0, 200.0, 150.0),
                effect: effect_of("sepia"),
                apply_crop: true,
                apply_filter: false,
            },
        )
        .unwrap();
        assert_eq!((out.width, out.height), (200, 150));
        // Top-left of the output is source pixel (50, 75), unfiltered
        assert_eq!(&out.pixels[0..3], &[50, 75, 200]);
    }

    #[test]
    fn test_filter_applies_to_cropped_region() {
        let src = gradient(100, 100);
        let gray = EffectSpec::new(vec![EffectOp::Grayscale(1.0)]);
        let out = apply_transform(
            &src,
            &TransformRequest {
                crop: rect(10.0, 10.0, 50.0, 50.0),
                effect: &gray,
                apply_crop: true,
                apply_filter: true,
            },
        )
        .unwrap();
        assert_eq!((out.width, out.height), (50, 50));
        for px in out.pixels.chunks_exact(3) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn test_identity_filter_is_noop() {
        let src = gradient(40, 40);
        let out = apply_transform(
            &src,
            &TransformRequest {
                crop: rect(0.0, 0.0, 40.0, 40.0),
                effect: effect_of("none"),
                apply_crop: true,
                apply_filter: true,
            },
        )
        .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_empty_surface_fails() {
        let empty = DecodedImage {
            width: 100,
            height: 100,
            pixels: Vec::new(),
        };
        let identity = EffectSpec::identity();
        let result = apply_transform(
            &empty,
            &TransformRequest {
                crop: rect(0.0, 0.0, 10.0, 10.0),
                effect: &identity,
                apply_crop: true,
                apply_filter: false,
            },
        );
        assert_eq!(result, Err(TransformError::SurfaceUnavailable));
    }

    #[test]
    fn test_rasterize_names_and_encodes() {
        let src = gradient(64, 48);
        let out = rasterize(
            &src,
            "beach.jpg",
            &TransformRequest {
                crop: rect(8.0, 8.0, 32.0, 16.0),
                effect: effect_of("vivid"),
                apply_crop: true,
                apply_filter: true,
            },
            RasterSettings::default(),
        )
        .unwrap();

        assert_eq!(out.original_name, "beach.jpg");
        assert_eq!((out.width, out.height), (32, 16));
        assert_eq!(out.format, OutputFormat::Png);

        let decoded = crate::decode::decode_image(&out.data).unwrap();
        assert_eq!((decoded.width, decoded.height), (32, 16));
    }

    #[test]
    fn test_rasterize_jpeg() {
        let src = gradient(20, 20);
        let identity = EffectSpec::identity();
        let out = rasterize(
            &src,
            "a.png",
            &TransformRequest {
                crop: rect(0.0, 0.0, 10.0, 10.0),
                effect: &identity,
                apply_crop: true,
                apply_filter: false,
            },
            RasterSettings {
                format: OutputFormat::Jpeg,
                quality: 80,
            },
        )
        .unwrap();
        assert_eq!(&out.data[0..2], &[0xFF, 0xD8]);
    }
}
