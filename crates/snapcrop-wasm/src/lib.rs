//! Snapcrop WASM - WebAssembly bindings for the Snapcrop editor
//!
//! This crate exposes snapcrop-core to a browser host.
//!
//! # Module Structure
//!
//! - `session` - The editing session handle: pointer control, confirm/back, batch runs
//! - `filters` - Filter catalog, CSS previews and pixel filtering
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Image decoding bindings (JPEG, PNG)
//! - `encode` - Image encoding bindings (JPEG, PNG)
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSession, filter_catalog } from '@snapcrop/wasm';
//!
//! await init();
//!
//! const session = new JsSession(uploadedImages, { batchPacingMs: 50 });
//! for (const f of filter_catalog()) addFilterButton(f.id, f.name, f.css);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod filters;
mod session;
mod types;

pub use decode::{decode_image, image_orientation};
pub use encode::{encode_jpeg, encode_png};
pub use filters::{apply_filter, filter_catalog, filter_css};
pub use session::JsSession;
pub use types::JsDecodedImage;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
