//! Image decoding WASM bindings.
//!
//! ```typescript
//! import { decode_image } from '@snapcrop/wasm';
//!
//! const bytes = new Uint8Array(await (await fetch(upload.url)).arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(`Decoded ${image.width}x${image.height}`);
//! ```

use crate::types::JsDecodedImage;
use snapcrop_core::decode;
use wasm_bindgen::prelude::*;

/// Decode a JPEG or PNG image from bytes, with EXIF orientation applied so the
/// pixel grid matches what the browser displays.
///
/// # Errors
///
/// Returns an error if the format is unrecognized or the data is corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// EXIF orientation tag value (1-8) of the image, 1 when absent.
#[wasm_bindgen]
pub fn image_orientation(bytes: &[u8]) -> u8 {
    decode::get_orientation(bytes) as u8
}
