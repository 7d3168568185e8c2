//! Editing session WASM bindings.
//!
//! `JsSession` is the handle a browser host keeps for the lifetime of the
//! editor page. Pointer and keyboard handlers call into it synchronously;
//! `run_batch` returns a `Promise` and keeps working between frames.
//!
//! ```typescript
//! import { JsSession, decode_image } from '@snapcrop/wasm';
//!
//! const session = JsSession.from_manifest(await response.text());
//! session.display_image(img.clientWidth, img.clientHeight);
//!
//! overlay.onpointerdown = (e) => session.begin_drag(e.offsetX, e.offsetY);
//! window.onpointermove = (e) => session.pointer_move(e.offsetX, e.offsetY);
//! window.onpointerup = () => session.pointer_up();
//!
//! const loader = async (url) => new Uint8Array(await (await fetch(url)).arrayBuffer());
//! const summary = await session.run_batch('both', innerWidth, innerHeight, loader,
//!   (p) => bar.value = p.current / p.total);
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use serde::Serialize;
use snapcrop_core::batch::{self, BatchMode, BatchObserver, BatchProgress, ImageLoader, Pacer};
use snapcrop_core::decode::{self, DecodeError, DecodedImage};
use snapcrop_core::geometry::{Handle, ImageBounds, Point};
use snapcrop_core::output::SkippedImage;
use snapcrop_core::session::{ConfirmOutcome, Session, SessionState};
use snapcrop_core::upload::{self, UploadManifest, UploadedImage};
use snapcrop_core::EditorConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::console;

use crate::types::JsDecodedImage;

/// Editing session handle for JavaScript.
#[wasm_bindgen]
pub struct JsSession {
    inner: Rc<RefCell<Session>>,
}

#[wasm_bindgen]
impl JsSession {
    /// Start a session over `images` (`[{ url, originalName, size, mimeType }]`).
    ///
    /// `config` is an optional partial `EditorConfig`. Non-image and
    /// oversized entries are dropped.
    #[wasm_bindgen(constructor)]
    pub fn new(images: JsValue, config: JsValue) -> Result<JsSession, JsValue> {
        let config = parse_config(config)?;
        let images: Vec<UploadedImage> = serde_wasm_bindgen::from_value(images)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let images = upload::accept_images(images, &config.upload);
        Ok(Self::wrap(Session::new(images, config)))
    }

    /// Start a session from the upload endpoint's JSON response.
    pub fn from_manifest(json: &str, config: JsValue) -> Result<JsSession, JsValue> {
        let config = parse_config(config)?;
        let images = UploadManifest::from_json(json)
            .and_then(|m| m.into_images(&config.upload))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::wrap(Session::new(images, config)))
    }

    // ----- observable state -----

    /// `"empty"`, `"browsing"` or `"finished"`.
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.inner.borrow().state() {
            SessionState::Empty => "empty",
            SessionState::Browsing(_) => "browsing",
            SessionState::Finished => "finished",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn current_index(&self) -> Option<u32> {
        self.inner.borrow().current_index().map(|i| i as u32)
    }

    #[wasm_bindgen(getter)]
    pub fn total(&self) -> u32 {
        self.inner.borrow().total() as u32
    }

    /// The image being edited, or `undefined`.
    pub fn current_image(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().current_image())
    }

    /// `{ x, y, width, height }` in display pixels.
    pub fn crop_box(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().crop_box())
    }

    /// `{ width, height }` of the displayed image, or `undefined`.
    pub fn bounds(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().bounds())
    }

    #[wasm_bindgen(getter)]
    pub fn filter_id(&self) -> String {
        self.inner.borrow().filter_id().to_string()
    }

    /// CSS `filter` value previewing the active filter.
    #[wasm_bindgen(getter)]
    pub fn filter_css(&self) -> String {
        self.inner.borrow().effect().to_css()
    }

    /// `{ current, total }` while a batch runs, otherwise `undefined`.
    pub fn batch_progress(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().batch_progress())
    }

    #[wasm_bindgen(getter)]
    pub fn is_batch_running(&self) -> bool {
        self.inner.borrow().is_batch_running()
    }

    #[wasm_bindgen(getter)]
    pub fn output_count(&self) -> u32 {
        self.inner.borrow().outputs().len() as u32
    }

    /// Output metadata `[{ originalName, width, height, format }]`.
    pub fn outputs(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().outputs().as_slice())
    }

    /// `[{ index, originalName, reason }]` for every image that produced no output.
    pub fn skipped(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().skipped())
    }

    /// Every output as `{ fileName, bytes, mimeType }`, ready for download.
    pub fn exports(&self) -> Result<Array, JsValue> {
        let session = self.inner.borrow();
        let items = Array::new();
        for item in session.outputs().exports() {
            let entry = Object::new();
            Reflect::set(&entry, &"fileName".into(), &JsValue::from_str(&item.file_name))?;
            Reflect::set(&entry, &"bytes".into(), &Uint8Array::from(item.bytes).into())?;
            Reflect::set(&entry, &"mimeType".into(), &item.mime_type.into())?;
            items.push(&entry);
        }
        Ok(items)
    }

    // ----- display and pointer -----

    /// The current image rendered at `width` x `height` display pixels.
    pub fn display_image(&self, width: f64, height: f64) {
        self.inner
            .borrow_mut()
            .display_image(ImageBounds::new(width, height));
    }

    /// The rendered size changed (resize, fullscreen).
    pub fn set_bounds(&self, width: f64, height: f64) {
        self.inner.borrow_mut().set_bounds(ImageBounds::new(width, height));
    }

    pub fn begin_drag(&self, x: f64, y: f64) -> bool {
        self.inner.borrow_mut().begin_drag(Point::new(x, y))
    }

    /// `handle` is one of `"nw"`, `"ne"`, `"sw"`, `"se"`.
    pub fn begin_resize(&self, x: f64, y: f64, handle: &str) -> Result<bool, JsValue> {
        let handle = Handle::parse(handle)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown resize handle: {handle}")))?;
        Ok(self.inner.borrow_mut().begin_resize(Point::new(x, y), handle))
    }

    pub fn pointer_move(&self, x: f64, y: f64) -> bool {
        self.inner.borrow_mut().pointer_move(Point::new(x, y))
    }

    pub fn pointer_up(&self) {
        self.inner.borrow_mut().pointer_up();
    }

    /// Returns the filter id now in effect.
    pub fn select_filter(&self, id: &str) -> String {
        self.inner.borrow_mut().select_filter(id).to_string()
    }

    // ----- navigation -----

    /// Crop the current image (already decoded) and advance.
    ///
    /// Returns `true` if an output was produced, `false` if the image was
    /// skipped.
    pub fn confirm(&self, image: &JsDecodedImage) -> Result<bool, JsValue> {
        let source = image.to_decoded();
        self.confirm_source(Some(&source))
    }

    /// Advance past an image whose pixels could not be loaded. The image is
    /// recorded as skipped.
    pub fn confirm_unloaded(&self) -> Result<bool, JsValue> {
        self.confirm_source(None)
    }

    pub fn go_back(&self) -> bool {
        self.inner.borrow_mut().go_back()
    }

    // ----- batch -----

    /// Apply the current crop and/or filter to this and every later image.
    ///
    /// `mode` is `"crop-only"`, `"filter-only"` or `"both"`. `loader(url)`
    /// must return the image bytes (or a promise of them) as a `Uint8Array` or
    /// `ArrayBuffer`. `on_progress({ current, total })` is called after each
    /// image. Resolves to `{ produced, skipped, attempted, total }`.
    pub fn run_batch(
        &self,
        mode: &str,
        viewport_width: f64,
        viewport_height: f64,
        loader: Function,
        on_progress: Option<Function>,
    ) -> Result<Promise, JsValue> {
        let mode = BatchMode::parse(mode)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown batch mode: {mode}")))?;

        let job = {
            let mut session = self.inner.borrow_mut();
            let envelope = session.config().envelope(viewport_width, viewport_height);
            session
                .prepare_batch(mode, envelope)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let session = Rc::clone(&self.inner);
        Ok(future_to_promise(async move {
            let loader = JsLoader { fetch: loader };
            let observer = HostObserver {
                session: Rc::clone(&session),
                on_progress,
            };
            let report = batch::run_batch(job, &loader, &TimeoutPacer, &observer).await;
            let summary = session
                .borrow_mut()
                .finish_batch(report)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            to_js(&summary)
        }))
    }
}

impl JsSession {
    fn wrap(session: Session) -> Self {
        Self {
            inner: Rc::new(RefCell::new(session)),
        }
    }

    fn confirm_source(&self, source: Option<&DecodedImage>) -> Result<bool, JsValue> {
        let outcome = self
            .inner
            .borrow_mut()
            .confirm(source)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        match outcome {
            ConfirmOutcome::Produced => Ok(true),
            ConfirmOutcome::Skipped(skipped) => {
                warn_skipped(&skipped);
                Ok(false)
            }
        }
    }
}

fn parse_config(value: JsValue) -> Result<EditorConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(EditorConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn describe(error: &JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}

fn warn_skipped(skipped: &SkippedImage) {
    console::warn_1(&JsValue::from_str(&format!(
        "Skipped {} ({}): {}",
        skipped.original_name, skipped.index, skipped.reason
    )));
}

/// Loads sources through a host-supplied JS function.
struct JsLoader {
    fetch: Function,
}

impl JsLoader {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, JsValue> {
        let value = self.fetch.call1(&JsValue::NULL, &JsValue::from_str(url))?;
        let value = JsFuture::from(Promise::resolve(&value)).await?;
        Ok(Uint8Array::new(&value).to_vec())
    }
}

impl ImageLoader for JsLoader {
    async fn load(&self, image: &UploadedImage) -> Result<DecodedImage, DecodeError> {
        let bytes = self
            .fetch_bytes(&image.url)
            .await
            .map_err(|e| DecodeError::Unavailable(describe(&e)))?;
        decode::decode_image(&bytes)
    }
}

/// Paces the batch with `setTimeout` so the page can repaint between images.
struct TimeoutPacer;

impl Pacer for TimeoutPacer {
    async fn pause(&self, duration: Duration) {
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window()
                .map(|w| {
                    w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                        .is_ok()
                })
                .unwrap_or(false);
            // No window (worker) or timer refused: continue immediately
            if !scheduled {
                if let Err(e) = resolve.call0(&JsValue::NULL) {
                    console::error_1(&e);
                }
            }
        });
        if let Err(e) = JsFuture::from(promise).await {
            console::error_1(&e);
        }
    }
}

/// Mirrors batch events into the session and the browser console.
struct HostObserver {
    session: Rc<RefCell<Session>>,
    on_progress: Option<Function>,
}

impl BatchObserver for HostObserver {
    fn on_progress(&self, progress: BatchProgress) {
        self.session.borrow_mut().record_progress(progress);
        console::log_1(&JsValue::from_str(&format!(
            "Batch progress {}/{}",
            progress.current, progress.total
        )));
        if let (Some(callback), Ok(value)) = (&self.on_progress, to_js(&progress)) {
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                console::error_1(&e);
            }
        }
    }

    fn on_skipped(&self, skipped: &SkippedImage) {
        warn_skipped(skipped);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn images(n: usize) -> JsValue {
        let images: Vec<UploadedImage> = (0..n)
            .map(|i| UploadedImage::new(format!("blob:{i}"), format!("img{i}.png")))
            .collect();
        serde_wasm_bindgen::to_value(&images).unwrap()
    }

    fn png_loader(fail_url: &'static str) -> Function {
        let png = snapcrop_core::encode::encode_png(&vec![90u8; 300 * 300 * 3], 300, 300).unwrap();
        let closure = Closure::wrap(Box::new(move |url: String| -> JsValue {
            if url == fail_url {
                Uint8Array::from(&[1u8, 2, 3][..]).into()
            } else {
                Uint8Array::from(&png[..]).into()
            }
        }) as Box<dyn FnMut(String) -> JsValue>);
        let function = closure.as_ref().unchecked_ref::<Function>().clone();
        closure.forget();
        function
    }

    #[wasm_bindgen_test]
    fn test_empty_session() {
        let session = JsSession::new(images(0), JsValue::UNDEFINED).unwrap();
        assert_eq!(session.state(), "empty");
        assert!(session.confirm_unloaded().is_err());
    }

    #[wasm_bindgen_test]
    fn test_confirm_flow() {
        let session = JsSession::new(images(2), JsValue::UNDEFINED).unwrap();
        let image = JsDecodedImage::new(300, 300, vec![0u8; 300 * 300 * 3]);

        session.display_image(300.0, 300.0);
        assert!(session.begin_drag(0.0, 0.0));
        assert!(session.pointer_move(1000.0, 1000.0));
        session.pointer_up();
        assert!(session.confirm(&image).unwrap());
        assert_eq!(session.current_index(), Some(1));

        assert!(!session.confirm_unloaded().unwrap());
        assert_eq!(session.state(), "finished");
        assert_eq!(session.output_count(), 1);

        let exports = session.exports().unwrap();
        assert_eq!(exports.length(), 1);
        let name = Reflect::get(&exports.get(0), &"fileName".into()).unwrap();
        assert_eq!(name.as_string().as_deref(), Some("cropped_img0.png"));
    }

    #[wasm_bindgen_test]
    fn test_confirm_needs_each_image_displayed() {
        let session = JsSession::new(images(2), JsValue::UNDEFINED).unwrap();
        let image = JsDecodedImage::new(300, 300, vec![0u8; 300 * 300 * 3]);
        session.display_image(300.0, 300.0);
        assert!(session.confirm(&image).unwrap());

        // Second image confirmed before the host reported its bounds
        assert!(!session.confirm(&image).unwrap());
        assert_eq!(session.output_count(), 1);
    }

    #[wasm_bindgen_test]
    async fn test_timeout_pacer_resolves() {
        TimeoutPacer.pause(Duration::from_millis(5)).await;
        TimeoutPacer.pause(Duration::ZERO).await;
    }

    #[wasm_bindgen_test]
    fn test_unknown_handle_and_mode() {
        let session = JsSession::new(images(1), JsValue::UNDEFINED).unwrap();
        assert!(session.begin_resize(0.0, 0.0, "north").is_err());
        assert!(session
            .run_batch("sideways", 800.0, 600.0, png_loader(""), None)
            .is_err());
        assert!(!session.is_batch_running());
    }

    #[wasm_bindgen_test]
    async fn test_run_batch_skips_failed_load() {
        let config = serde_wasm_bindgen::to_value(&EditorConfig {
            batch_pacing_ms: 0,
            ..EditorConfig::default()
        })
        .unwrap();
        let session = JsSession::new(images(5), config).unwrap();
        session.display_image(300.0, 300.0);
        session.select_filter("sepia");

        let promise = session
            .run_batch("both", 1000.0, 1000.0, png_loader("blob:2"), None)
            .unwrap();
        assert!(session.is_batch_running());

        let summary = JsFuture::from(promise).await.unwrap();
        let attempted = Reflect::get(&summary, &"attempted".into()).unwrap();
        assert_eq!(attempted.as_f64(), Some(5.0));
        assert_eq!(session.output_count(), 4);
        assert_eq!(session.state(), "finished");
        assert!(!session.is_batch_running());
    }
}
