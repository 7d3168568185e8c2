//! Filter catalog WASM bindings.
//!
//! The host renders previews with CSS (`filter_css`) and the core rasterizes
//! with the same effect, so what the user sees is what gets exported.

use crate::types::JsDecodedImage;
use snapcrop_core::filter;
use wasm_bindgen::prelude::*;

/// The filter catalog as `[{ id, name, css }]`, in display order.
#[wasm_bindgen]
pub fn filter_catalog() -> Result<JsValue, JsValue> {
    let entries: Vec<CatalogEntry> = filter::catalog()
        .iter()
        .map(|f| CatalogEntry {
            id: f.id,
            name: f.name,
            css: f.effect.to_css(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&entries).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(serde::Serialize)]
struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    css: String,
}

/// CSS `filter` value for a filter id; `"none"` for unknown ids.
#[wasm_bindgen]
pub fn filter_css(id: &str) -> String {
    filter::effect_of(id).to_css()
}

/// Apply a catalog filter to an image, returning a new image.
#[wasm_bindgen]
pub fn apply_filter(image: &JsDecodedImage, id: &str) -> JsDecodedImage {
    let mut decoded = image.to_decoded();
    filter::effect_of(id).apply(&mut decoded.pixels);
    JsDecodedImage::from_decoded(decoded)
}
