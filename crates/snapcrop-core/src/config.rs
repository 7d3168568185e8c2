//! Editor configuration.
//!
//! Every field has a default, so hosts may pass a partial JSON object (or
//! nothing at all) and get the stock editor behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encode::OutputFormat;
use crate::geometry::{CropSize, ViewportEnvelope, DEFAULT_CROP_SIZE, MIN_CROP_SIZE};
use crate::transform::RasterSettings;
use crate::upload::UploadLimits;

/// Tunables for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Smallest crop edge in display pixels.
    pub min_crop_size: f64,
    /// Crop box placed on the first image.
    pub default_crop: CropSize,
    /// Share of the viewport width an image may occupy.
    pub viewport_width_ratio: f64,
    /// Share of the viewport height an image may occupy.
    pub viewport_height_ratio: f64,
    /// Pause between batch images, in milliseconds.
    pub batch_pacing_ms: u64,
    pub output_format: OutputFormat,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    pub upload: UploadLimits,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_crop_size: MIN_CROP_SIZE,
            default_crop: DEFAULT_CROP_SIZE,
            viewport_width_ratio: 0.8,
            viewport_height_ratio: 0.7,
            batch_pacing_ms: 100,
            output_format: OutputFormat::Png,
            jpeg_quality: 92,
            upload: UploadLimits::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn raster_settings(&self) -> RasterSettings {
        RasterSettings {
            format: self.output_format,
            quality: self.jpeg_quality.clamp(1, 100),
        }
    }

    /// Viewport envelope for a host viewport of the given size.
    pub fn envelope(&self, viewport_width: f64, viewport_height: f64) -> ViewportEnvelope {
        ViewportEnvelope::from_viewport(
            viewport_width,
            viewport_height,
            self.viewport_width_ratio,
            self.viewport_height_ratio,
        )
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.min_crop_size, 50.0);
        assert_eq!(config.default_crop, CropSize { width: 200.0, height: 150.0 });
        assert_eq!(config.pacing(), Duration::from_millis(100));
        assert_eq!(config.raster_settings(), RasterSettings::default());
        assert_eq!(config.upload.max_files, 10);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(
            r#"{"outputFormat": "jpeg", "jpegQuality": 80, "upload": {"maxFiles": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.upload.max_files, 3);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.batch_pacing_ms, 100);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_envelope() {
        let config = EditorConfig::default();
        let env = config.envelope(1000.0, 1000.0);
        assert_eq!(env.max_width, 800.0);
        assert_eq!(env.max_height, 700.0);
    }

    #[test]
    fn test_quality_is_clamped() {
        let config = EditorConfig {
            jpeg_quality: 0,
            ..EditorConfig::default()
        };
        assert_eq!(config.raster_settings().quality, 1);
    }
}
