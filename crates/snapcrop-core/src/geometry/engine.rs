//! Stateful crop-box engine driven by pointer events.

use tracing::debug;

use super::{CropBox, CropSize, Handle, ImageBounds, NativeRect, Point};

/// Pointer interaction in progress.
///
/// Holding one of these is the engine's subscription to pointer moves: moves
/// arriving while no interaction is active are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Drag { last: Point },
    Resize { last: Point, handle: Handle },
}

/// Owns the live crop box and the displayed bounds it is clamped against.
///
/// Every mutation reads the latest committed box and bounds and commits a
/// re-clamped box, so the box is never observable in an invalid state.
#[derive(Debug, Clone)]
pub struct CropEngine {
    crop: CropBox,
    bounds: Option<ImageBounds>,
    interaction: Option<Interaction>,
    min_size: f64,
    default_size: CropSize,
}

impl CropEngine {
    pub fn new(min_size: f64, default_size: CropSize) -> Self {
        Self {
            crop: CropBox::default(),
            bounds: None,
            interaction: None,
            min_size,
            default_size,
        }
    }

    /// Current crop box in display space.
    pub fn crop_box(&self) -> CropBox {
        self.crop
    }

    /// Bounds of the displayed image, once one has been displayed.
    pub fn bounds(&self) -> Option<ImageBounds> {
        self.bounds
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    /// Adopt new displayed bounds (resize, fullscreen) and re-clamp.
    pub fn set_bounds(&mut self, bounds: ImageBounds) {
        self.bounds = Some(bounds);
        self.crop = self.crop.constrained(bounds, self.min_size);
    }

    /// Forget the displayed bounds when a different image is about to be
    /// shown. The box is kept but cannot be mapped or moved until the next
    /// image reports its bounds.
    pub fn clear_bounds(&mut self) {
        self.bounds = None;
        self.interaction = None;
    }

    /// Place the default-size box centered in `bounds`.
    pub fn reset_centered(&mut self, bounds: ImageBounds) {
        self.bounds = Some(bounds);
        self.crop = CropBox::centered(bounds, self.default_size, self.min_size);
        debug!(crop = ?self.crop, "Crop box centered");
    }

    /// Adopt a saved placement, clamped into `bounds`.
    pub fn restore(&mut self, saved: CropBox, bounds: ImageBounds) {
        self.bounds = Some(bounds);
        self.crop = saved.constrained(bounds, self.min_size);
        debug!(crop = ?self.crop, "Crop box restored");
    }

    /// Start moving the whole box. Ends any interaction in progress.
    pub fn begin_drag(&mut self, at: Point) {
        self.interaction = Some(Interaction::Drag { last: at });
    }

    /// Start resizing from a corner. Ends any interaction in progress.
    pub fn begin_resize(&mut self, at: Point, handle: Handle) {
        self.interaction = Some(Interaction::Resize { last: at, handle });
    }

    /// Apply a pointer move. Deltas are taken from the previous move, not
    /// from where the interaction began.
    ///
    /// Returns `true` when the move was consumed by an active interaction.
    /// Non-finite positions are dropped.
    pub fn on_pointer_move(&mut self, at: Point) -> bool {
        if !at.x.is_finite() || !at.y.is_finite() {
            return false;
        }
        let (Some(interaction), Some(bounds)) = (self.interaction.as_mut(), self.bounds) else {
            return false;
        };

        match interaction {
            Interaction::Drag { last } => {
                let (dx, dy) = (at.x - last.x, at.y - last.y);
                self.crop = self.crop.dragged(dx, dy, bounds, self.min_size);
                *last = at;
            }
            Interaction::Resize { last, handle } => {
                let (dx, dy) = (at.x - last.x, at.y - last.y);
                self.crop = self.crop.resized(*handle, dx, dy, bounds, self.min_size);
                *last = at;
            }
        }
        true
    }

    /// Pointer released: drop the interaction.
    pub fn end_interaction(&mut self) {
        self.interaction = None;
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction.is_some()
    }

    /// Handle of the resize in progress, if any.
    pub fn active_handle(&self) -> Option<Handle> {
        match self.interaction {
            Some(Interaction::Resize { handle, .. }) => Some(handle),
            _ => None,
        }
    }

    /// Current box in native pixels of an image whose native size is `natural`.
    ///
    /// `None` until an image has been displayed.
    pub fn to_native_rect(&self, natural: ImageBounds) -> Option<NativeRect> {
        self.bounds
            .map(|display| self.crop.to_native_rect(natural, display))
    }
}
