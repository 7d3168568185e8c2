//! Image encoding WASM bindings.
//!
//! ```typescript
//! import { encode_png, encode_jpeg } from '@snapcrop/wasm';
//!
//! const png = encode_png(image.pixels(), image.width, image.height);
//! const jpeg = encode_jpeg(image.pixels(), image.width, image.height, 92);
//! ```

use snapcrop_core::encode;
use wasm_bindgen::prelude::*;

/// Encode RGB pixel data to JPEG bytes.
///
/// # Errors
///
/// Returns an error if the pixel data length doesn't match width * height * 3,
/// or either dimension is zero.
#[wasm_bindgen]
pub fn encode_jpeg(pixels: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(pixels, width, height, quality).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode RGB pixel data to PNG bytes.
#[wasm_bindgen]
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(pixels, width, height).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_encode_jpeg_basic() {
        let pixels = vec![128u8; 100 * 100 * 3];
        let jpeg = encode_jpeg(&pixels, 100, 100, 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_encode_png_basic() {
        let pixels = vec![10u8; 20 * 10 * 3];
        let png = encode_png(&pixels, 20, 10).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[wasm_bindgen_test]
    fn test_encode_invalid_input() {
        assert!(encode_jpeg(&[128u8; 100], 0, 100, 90).is_err());
        assert!(encode_png(&[128u8; 50 * 50 * 3], 100, 100).is_err());
    }
}
