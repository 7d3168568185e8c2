use tracing::{debug, info, warn};

use super::{BatchJob, BatchObserver, BatchProgress, BatchReport, ImageLoader, Pacer};
use crate::decode::DecodedImage;
use crate::geometry::{fit_to_viewport, ImageBounds};
use crate::output::{OutputImage, SkippedImage};
use crate::transform::{rasterize, TransformError, TransformRequest};
use crate::upload::UploadedImage;

/// Run `job` to completion.
///
/// Images are processed strictly in order. A failed load or rasterization
/// skips that one image; the batch always runs to the end of the queue.
/// `observer` sees every attempt before the pacing pause that follows it.
pub async fn run_batch<L, P, O>(job: BatchJob, loader: &L, pacer: &P, observer: &O) -> BatchReport
where
    L: ImageLoader,
    P: Pacer,
    O: BatchObserver + ?Sized,
{
    let total = job.images.len();
    let (apply_crop, apply_filter) = job.mode.stages();
    info!(
        start = job.start_index,
        total,
        mode = ?job.mode,
        "Batch started"
    );

    let mut report = BatchReport {
        total,
        ..BatchReport::default()
    };

    for (offset, image) in job.images.iter().enumerate() {
        let index = job.start_index + offset;

        let result = match loader.load(image).await {
            Ok(source) => process_one(&job, &source, image, apply_crop, apply_filter),
            Err(e) => Err(TransformError::from(e)),
        };

        match result {
            Ok(output) => {
                debug!(index, width = output.width, height = output.height, "Batch image done");
                report.outputs.push(output);
            }
            Err(e) => {
                warn!(index, name = %image.original_name, error = %e, "Skipping image");
                let skipped = SkippedImage {
                    index,
                    original_name: image.original_name.clone(),
                    reason: e.to_string(),
                };
                observer.on_skipped(&skipped);
                report.skipped.push(skipped);
            }
        }

        report.attempted = offset + 1;
        observer.on_progress(BatchProgress {
            current: report.attempted,
            total,
        });

        if report.attempted < total {
            pacer.pause(job.pacing).await;
        }
    }

    info!(
        produced = report.outputs.len(),
        skipped = report.skipped.len(),
        "Batch finished"
    );
    report
}

/// Map the job's display-space crop onto `source` and rasterize it.
fn process_one(
    job: &BatchJob,
    source: &DecodedImage,
    image: &UploadedImage,
    apply_crop: bool,
    apply_filter: bool,
) -> Result<OutputImage, TransformError> {
    let natural = source.natural_size();
    let bounds = display_bounds(natural, job);
    let crop = job
        .crop_box
        .constrained(bounds, job.min_crop_size)
        .to_native_rect(natural, bounds);

    let request = TransformRequest {
        crop,
        effect: &job.effect,
        apply_crop,
        apply_filter,
    };
    rasterize(source, &image.original_name, &request, job.output)
}

/// Bounds the image would have on screen. An empty envelope leaves the image
/// at native size.
fn display_bounds(natural: ImageBounds, job: &BatchJob) -> ImageBounds {
    let fitted = fit_to_viewport(natural, job.envelope);
    if fitted.width > 0.0 && fitted.height > 0.0 {
        fitted
    } else {
        natural
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::batch::{BatchMode, NoOpObserver, NoPacing};
    use crate::decode::DecodeError;
    use crate::filter::{effect_of, EffectSpec};
    use crate::geometry::{CropBox, ViewportEnvelope, MIN_CROP_SIZE};
    use crate::transform::RasterSettings;

    /// Serves pre-decoded images by URL; unknown URLs fail to decode.
    struct MapLoader {
        images: HashMap<String, DecodedImage>,
        calls: RefCell<Vec<String>>,
    }

    impl MapLoader {
        fn new(entries: Vec<(UploadedImage, DecodedImage)>) -> Self {
            Self {
                images: entries.into_iter().map(|(u, d)| (u.url, d)).collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageLoader for MapLoader {
        async fn load(&self, image: &UploadedImage) -> Result<DecodedImage, DecodeError> {
            self.calls.borrow_mut().push(image.url.clone());
            self.images
                .get(&image.url)
                .cloned()
                .ok_or_else(|| DecodeError::CorruptedFile(format!("no data for {}", image.url)))
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        pauses: RefCell<Vec<Duration>>,
    }

    impl Pacer for RecordingPacer {
        async fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        progress: RefCell<Vec<BatchProgress>>,
        skipped: RefCell<Vec<usize>>,
    }

    impl BatchObserver for RecordingObserver {
        fn on_progress(&self, progress: BatchProgress) {
            self.progress.borrow_mut().push(progress);
        }

        fn on_skipped(&self, skipped: &SkippedImage) {
            self.skipped.borrow_mut().push(skipped.index);
        }
    }

    fn upload(i: usize) -> UploadedImage {
        UploadedImage::new(format!("http://host/uploads/{i}.png"), format!("photo{i}.png"))
    }

    fn job(images: Vec<UploadedImage>, mode: BatchMode, effect: EffectSpec) -> BatchJob {
        BatchJob {
            start_index: 0,
            images,
            crop_box: CropBox::new(50.0, 75.0, 200.0, 150.0),
            min_crop_size: MIN_CROP_SIZE,
            effect,
            mode,
            envelope: ViewportEnvelope::new(300.0, 300.0),
            pacing: Duration::from_millis(100),
            output: RasterSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_decode_failure_is_skipped_and_batch_completes() {
        let images: Vec<_> = (0..5).map(upload).collect();
        let loader = MapLoader::new(
            images
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != 2)
                .map(|(_, u)| (u.clone(), DecodedImage::filled(300, 300, [120, 60, 30])))
                .collect(),
        );
        let pacer = RecordingPacer::default();
        let observer = RecordingObserver::default();

        let report = run_batch(
            job(images, BatchMode::Both, effect_of("sepia").clone()),
            &loader,
            &pacer,
            &observer,
        )
        .await;

        assert_eq!(report.outputs.len(), 4);
        assert_eq!(report.attempted, 5);
        assert_eq!(report.total, 5);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 2);
        assert_eq!(report.skipped[0].original_name, "photo2.png");
        assert!(report.skipped[0].reason.starts_with("Decode failed"));

        let names: Vec<_> = report.outputs.iter().map(|o| o.original_name.as_str()).collect();
        assert_eq!(names, vec!["photo0.png", "photo1.png", "photo3.png", "photo4.png"]);

        let progress = observer.progress.borrow();
        assert_eq!(progress.len(), 5);
        assert_eq!(progress.last(), Some(&BatchProgress { current: 5, total: 5 }));
        assert_eq!(*observer.skipped.borrow(), vec![2]);
        assert_eq!(loader.calls.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_pacing_between_images_only() {
        let images: Vec<_> = (0..3).map(upload).collect();
        let loader = MapLoader::new(
            images
                .iter()
                .map(|u| (u.clone(), DecodedImage::filled(300, 300, [0, 0, 0])))
                .collect(),
        );
        let pacer = RecordingPacer::default();

        run_batch(
            job(images, BatchMode::CropOnly, EffectSpec::identity()),
            &loader,
            &pacer,
            &NoOpObserver,
        )
        .await;

        assert_eq!(
            *pacer.pauses.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
    }

    #[tokio::test]
    async fn test_crop_only_with_no_filter_keeps_colors() {
        let images = vec![upload(0)];
        let loader = MapLoader::new(vec![(
            images[0].clone(),
            DecodedImage::filled(300, 300, [10, 200, 90]),
        )]);

        let report = run_batch(
            job(images, BatchMode::CropOnly, effect_of("none").clone()),
            &loader,
            &NoPacing,
            &NoOpObserver,
        )
        .await;

        let out = &report.outputs[0];
        assert_eq!((out.width, out.height), (200, 150));
        let decoded = crate::decode::decode_image(&out.data).unwrap();
        assert!(decoded.pixels.chunks_exact(3).all(|px| px == [10, 200, 90]));
    }

    #[tokio::test]
    async fn test_crop_only_ignores_selected_filter() {
        let images = vec![upload(0)];
        let loader = MapLoader::new(vec![(
            images[0].clone(),
            DecodedImage::filled(300, 300, [10, 200, 90]),
        )]);

        let report = run_batch(
            job(images, BatchMode::CropOnly, effect_of("invert").clone()),
            &loader,
            &NoPacing,
            &NoOpObserver,
        )
        .await;

        let decoded = crate::decode::decode_image(&report.outputs[0].data).unwrap();
        assert_eq!(&decoded.pixels[0..3], &[10, 200, 90]);
    }

    #[tokio::test]
    async fn test_filter_only_keeps_native_size() {
        let images = vec![upload(0)];
        let loader = MapLoader::new(vec![(
            images[0].clone(),
            DecodedImage::filled(640, 480, [255, 0, 0]),
        )]);

        let report = run_batch(
            job(images, BatchMode::FilterOnly, effect_of("grayscale").clone()),
            &loader,
            &NoPacing,
            &NoOpObserver,
        )
        .await;

        let out = &report.outputs[0];
        assert_eq!((out.width, out.height), (640, 480));
        let decoded = crate::decode::decode_image(&out.data).unwrap();
        let px = &decoded.pixels[0..3];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[tokio::test]
    async fn test_crop_scales_to_each_native_resolution() {
        // 1200x900 fits a 300x300 envelope at 300x225, scale 4
        let images = vec![upload(0), upload(1)];
        let loader = MapLoader::new(vec![
            (images[0].clone(), DecodedImage::filled(1200, 900, [1, 2, 3])),
            (images[1].clone(), DecodedImage::filled(300, 300, [1, 2, 3])),
        ]);

        let report = run_batch(
            job(images, BatchMode::CropOnly, EffectSpec::identity()),
            &loader,
            &NoPacing,
            &NoOpObserver,
        )
        .await;

        // Box (50,75,200,150) fits 300x225 as-is, then scales by 4
        assert_eq!((report.outputs[0].width, report.outputs[0].height), (800, 600));
        assert_eq!((report.outputs[1].width, report.outputs[1].height), (200, 150));
    }

    #[tokio::test]
    async fn test_box_is_clamped_into_smaller_images() {
        let images = vec![upload(0)];
        let loader = MapLoader::new(vec![(
            images[0].clone(),
            DecodedImage::filled(120, 80, [5, 5, 5]),
        )]);

        let report = run_batch(
            job(images, BatchMode::CropOnly, EffectSpec::identity()),
            &loader,
            &NoPacing,
            &NoOpObserver,
        )
        .await;

        assert_eq!((report.outputs[0].width, report.outputs[0].height), (120, 80));
    }

    #[tokio::test]
    async fn test_start_index_offsets_skipped_index() {
        let images = vec![upload(3), upload(4)];
        let loader = MapLoader::new(vec![(
            images[1].clone(),
            DecodedImage::filled(300, 300, [0, 0, 0]),
        )]);
        let mut j = job(images, BatchMode::Both, EffectSpec::identity());
        j.start_index = 3;

        let report = run_batch(j, &loader, &NoPacing, &NoOpObserver).await;
        assert_eq!(report.skipped[0].index, 3);
        assert_eq!(report.outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let loader = MapLoader::new(Vec::new());
        let pacer = RecordingPacer::default();
        let report = run_batch(
            job(Vec::new(), BatchMode::Both, EffectSpec::identity()),
            &loader,
            &pacer,
            &NoOpObserver,
        )
        .await;
        assert_eq!(report.attempted, 0);
        assert!(report.outputs.is_empty());
        assert!(pacer.pauses.borrow().is_empty());
    }
}
