//! Source image decoding.
//!
//! Uploaded images arrive as encoded bytes (JPEG or PNG). Decoding produces
//! a packed RGB [`DecodedImage`] in native pixel space with EXIF orientation
//! already applied, which is the surface every transform reads from.

mod source;
mod types;

pub use source::{decode_image, get_orientation};
pub use types::{DecodeError, DecodedImage, Orientation};
