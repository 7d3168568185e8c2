//! Output encoding for finished crops.
//!
//! Each rasterized crop is encoded to a standalone file (PNG by default,
//! JPEG optionally) before it is handed to the output collector.

mod raster;

pub use raster::{encode, encode_jpeg, encode_png, EncodeError, OutputFormat};
