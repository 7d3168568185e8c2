//! Snapcrop Core - crop and filter engine
//!
//! This crate provides the editing core for Snapcrop: the crop geometry
//! engine, the filter catalog, single-image rasterization, the batch
//! pipeline and the session navigator that ties them together.
//!
//! Everything here is host-agnostic. A browser host drives it through
//! `snapcrop-wasm`; native hosts and tests use it directly. The library
//! emits `tracing` events but never installs a subscriber.

pub mod batch;
pub mod config;
pub mod decode;
pub mod encode;
pub mod filter;
pub mod geometry;
pub mod output;
pub mod session;
pub mod transform;
pub mod upload;

pub use batch::{
    run_batch, BatchJob, BatchMode, BatchObserver, BatchProgress, BatchReport, BatchSummary,
    ImageLoader, NoOpObserver, NoPacing, Pacer,
};
pub use config::EditorConfig;
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use encode::{EncodeError, OutputFormat};
pub use filter::{catalog, effect_of, EffectOp, EffectSpec, FilterDescriptor};
pub use geometry::{
    fit_to_viewport, CropBox, CropEngine, CropSize, Handle, ImageBounds, NativeRect, Point,
    ViewportEnvelope, MIN_CROP_SIZE,
};
pub use output::{ExportItem, OutputCollector, OutputImage, SkippedImage};
pub use session::{ConfirmOutcome, Session, SessionError, SessionState};
pub use transform::{apply_transform, rasterize, RasterSettings, TransformError, TransformRequest};
pub use upload::{UploadError, UploadLimits, UploadManifest, UploadedImage};
