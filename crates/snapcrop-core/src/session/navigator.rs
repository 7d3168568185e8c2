use tracing::{debug, info, warn};

use super::{SessionError, SessionState};
use crate::batch::{
    self, BatchJob, BatchMode, BatchObserver, BatchProgress, BatchReport, BatchSummary,
    ImageLoader, Pacer,
};
use crate::config::EditorConfig;
use crate::decode::DecodedImage;
use crate::filter::{self, EffectSpec};
use crate::geometry::{CropBox, CropEngine, Handle, ImageBounds, Point, ViewportEnvelope};
use crate::output::{OutputCollector, OutputImage, SkippedImage};
use crate::transform::{rasterize, TransformError, TransformRequest};
use crate::upload::UploadedImage;

/// What a confirm did with the current image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// An output was appended to the collector.
    Produced,
    /// The image could not be rasterized and was skipped.
    Skipped(SkippedImage),
}

/// One editing session over an uploaded sequence.
#[derive(Debug, Clone)]
pub struct Session {
    images: Vec<UploadedImage>,
    state: SessionState,
    engine: CropEngine,
    /// Placement carried from the previous image.
    saved: Option<CropBox>,
    filter_id: &'static str,
    /// `Some` exactly while a batch runs.
    progress: Option<BatchProgress>,
    outputs: OutputCollector,
    skipped: Vec<SkippedImage>,
    config: EditorConfig,
}

impl Session {
    pub fn new(images: Vec<UploadedImage>, config: EditorConfig) -> Self {
        let state = if images.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Browsing(0)
        };
        info!(images = images.len(), ?state, "Session started");

        Self {
            images,
            state,
            engine: CropEngine::new(config.min_crop_size, config.default_crop),
            saved: None,
            filter_id: filter::NONE_FILTER_ID,
            progress: None,
            outputs: OutputCollector::new(),
            skipped: Vec::new(),
            config,
        }
    }

    // ----- observable state -----

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn current_image(&self) -> Option<&UploadedImage> {
        self.current_index().and_then(|i| self.images.get(i))
    }

    pub fn crop_box(&self) -> CropBox {
        self.engine.crop_box()
    }

    /// Bounds of the displayed image, once one has been displayed.
    pub fn bounds(&self) -> Option<ImageBounds> {
        self.engine.bounds()
    }

    pub fn saved_placement(&self) -> Option<CropBox> {
        self.saved
    }

    pub fn filter_id(&self) -> &'static str {
        self.filter_id
    }

    pub fn effect(&self) -> &'static EffectSpec {
        filter::effect_of(self.filter_id)
    }

    pub fn batch_progress(&self) -> Option<BatchProgress> {
        self.progress
    }

    pub fn is_batch_running(&self) -> bool {
        self.progress.is_some()
    }

    pub fn outputs(&self) -> &OutputCollector {
        &self.outputs
    }

    pub fn skipped(&self) -> &[SkippedImage] {
        &self.skipped
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ----- display -----

    /// The current image has rendered at `bounds`.
    ///
    /// Adopts the saved placement when there is one, otherwise centers the
    /// default box.
    pub fn display_image(&mut self, bounds: ImageBounds) {
        if !self.accepts_edits() {
            return;
        }
        match self.saved {
            Some(saved) => self.engine.restore(saved, bounds),
            None => self.engine.reset_centered(bounds),
        }
    }

    /// The displayed size changed (window resize, fullscreen).
    pub fn set_bounds(&mut self, bounds: ImageBounds) {
        if !self.accepts_edits() {
            return;
        }
        self.engine.set_bounds(bounds);
    }

    // ----- pointer and filter control -----

    pub fn begin_drag(&mut self, at: Point) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        self.engine.begin_drag(at);
        true
    }

    pub fn begin_resize(&mut self, at: Point, handle: Handle) -> bool {
        if !self.accepts_edits() {
            return false;
        }
        self.engine.begin_resize(at, handle);
        true
    }

    /// Forward a pointer move. Returns `true` if the crop box was updated.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.accepts_edits() && self.engine.on_pointer_move(at)
    }

    pub fn pointer_up(&mut self) {
        self.engine.end_interaction();
    }

    /// Select a filter; unknown ids select `"none"`. Returns the id in effect.
    pub fn select_filter(&mut self, id: &str) -> &'static str {
        if self.accepts_edits() {
            self.filter_id = filter::resolve_id(id);
            debug!(filter = self.filter_id, "Filter selected");
        }
        self.filter_id
    }

    // ----- navigation -----

    /// Rasterize the current image with the live crop and filter, then
    /// advance.
    ///
    /// `source` is the decoded current image; `None` means it is not ready
    /// yet. A failed rasterization is recorded and the session still
    /// advances.
    pub fn confirm(
        &mut self,
        source: Option<&DecodedImage>,
    ) -> Result<ConfirmOutcome, SessionError> {
        let index = self.editable_index()?;
        let name = self.images[index].original_name.clone();

        let outcome = match self.rasterize_current(source, &name) {
            Ok(output) => {
                debug!(index, width = output.width, height = output.height, "Image confirmed");
                self.outputs.push(output);
                ConfirmOutcome::Produced
            }
            Err(e) => {
                warn!(index, name = %name, error = %e, "Skipping image");
                let skipped = SkippedImage {
                    index,
                    original_name: name,
                    reason: e.to_string(),
                };
                self.skipped.push(skipped.clone());
                ConfirmOutcome::Skipped(skipped)
            }
        };

        self.save_placement();
        self.transition(if index + 1 < self.images.len() {
            SessionState::Browsing(index + 1)
        } else {
            SessionState::Finished
        });
        Ok(outcome)
    }

    /// Step back one image without producing output. Returns `false` at the
    /// first image or when not browsing.
    pub fn go_back(&mut self) -> bool {
        match self.state {
            SessionState::Browsing(i) if i > 0 && !self.is_batch_running() => {
                self.save_placement();
                self.transition(SessionState::Browsing(i - 1));
                true
            }
            _ => false,
        }
    }

    fn rasterize_current(
        &self,
        source: Option<&DecodedImage>,
        name: &str,
    ) -> Result<OutputImage, TransformError> {
        let source = source
            .filter(|s| !s.is_empty())
            .ok_or(TransformError::SurfaceUnavailable)?;
        let crop = self
            .engine
            .to_native_rect(source.natural_size())
            .ok_or(TransformError::NotDisplayed)?;

        let request = TransformRequest {
            crop,
            effect: self.effect(),
            apply_crop: true,
            apply_filter: true,
        };
        rasterize(source, name, &request, self.config.raster_settings())
    }

    // ----- batch -----

    /// Detach a batch over the current and every later image.
    ///
    /// Marks the batch as running; progress starts at `0/total`. Hand the job
    /// to [`batch::run_batch`] and the report back to [`Session::finish_batch`].
    pub fn prepare_batch(
        &mut self,
        mode: BatchMode,
        envelope: ViewportEnvelope,
    ) -> Result<BatchJob, SessionError> {
        let start_index = self.editable_index()?;
        self.engine.end_interaction();

        // Current image not on screen yet: fall back to the placement carried
        // from the previous image, then to the default box on a full-envelope image
        let crop_box = match (self.engine.bounds(), self.saved) {
            (Some(_), _) => self.engine.crop_box(),
            (None, Some(saved)) => saved,
            (None, None) => CropBox::centered(
                ImageBounds::new(envelope.max_width, envelope.max_height),
                self.config.default_crop,
                self.config.min_crop_size,
            ),
        };

        let images = self.images[start_index..].to_vec();
        self.progress = Some(BatchProgress {
            current: 0,
            total: images.len(),
        });
        info!(start_index, total = images.len(), ?mode, filter = self.filter_id, "Batch prepared");

        Ok(BatchJob {
            start_index,
            images,
            crop_box,
            min_crop_size: self.config.min_crop_size,
            effect: self.effect().clone(),
            mode,
            envelope,
            pacing: self.config.pacing(),
            output: self.config.raster_settings(),
        })
    }

    /// Update the observable progress of the running batch.
    pub fn record_progress(&mut self, progress: BatchProgress) {
        if let Some(current) = self.progress.as_mut() {
            *current = progress;
        }
    }

    /// Collect a finished batch: outputs are appended in order, failures are
    /// recorded, progress clears and the session finishes.
    pub fn finish_batch(&mut self, report: BatchReport) -> Result<BatchSummary, SessionError> {
        if self.progress.is_none() {
            return Err(SessionError::NoBatchRunning);
        }

        let summary = report.summary();
        self.outputs.extend(report.outputs);
        self.skipped.extend(report.skipped);
        self.progress = None;
        self.transition(SessionState::Finished);
        Ok(summary)
    }

    /// Prepare, run and finish a batch in one call.
    ///
    /// The session is borrowed for the whole run, so progress reaches the
    /// host only through `observer`.
    pub async fn run_batch<L, P, O>(
        &mut self,
        mode: BatchMode,
        envelope: ViewportEnvelope,
        loader: &L,
        pacer: &P,
        observer: &O,
    ) -> Result<BatchSummary, SessionError>
    where
        L: ImageLoader,
        P: Pacer,
        O: BatchObserver + ?Sized,
    {
        let job = self.prepare_batch(mode, envelope)?;
        let report = batch::run_batch(job, loader, pacer, observer).await;
        self.finish_batch(report)
    }

    // ----- internals -----

    /// Index of the image being edited, or why editing is not possible.
    fn editable_index(&self) -> Result<usize, SessionError> {
        if self.is_batch_running() {
            return Err(SessionError::BatchRunning);
        }
        match self.state {
            SessionState::Browsing(i) => Ok(i),
            SessionState::Empty => Err(SessionError::Empty),
            SessionState::Finished => Err(SessionError::Finished),
        }
    }

    fn accepts_edits(&self) -> bool {
        self.editable_index().is_ok()
    }

    fn save_placement(&mut self) {
        self.engine.end_interaction();
        if self.engine.bounds().is_some() {
            self.saved = Some(self.engine.crop_box());
        }
    }

    /// Move to `next`. The previous image's bounds are dropped so nothing is
    /// mapped through them before the next image is displayed.
    fn transition(&mut self, next: SessionState) {
        info!(from = ?self.state, to = ?next, "Session state changed");
        self.engine.clear_bounds();
        self.state = next;
    }
}
