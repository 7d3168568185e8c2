//! Filter catalog: the fixed, ordered set of color effects a user can pick.
//!
//! `"none"` is always the first entry and maps to the identity effect.
//! Lookups never fail: unknown identifiers resolve to identity as well.

mod effect;

use std::sync::OnceLock;

use serde::Serialize;

pub use effect::{EffectOp, EffectSpec};

/// Identifier of the identity filter.
pub const NONE_FILTER_ID: &str = "none";

/// A named entry in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub effect: EffectSpec,
}

impl FilterDescriptor {
    fn new(id: &'static str, name: &'static str, ops: Vec<EffectOp>) -> Self {
        Self {
            id,
            name,
            effect: EffectSpec::new(ops),
        }
    }
}

/// All filters, in display order.
pub fn catalog() -> &'static [FilterDescriptor] {
    static CATALOG: OnceLock<Vec<FilterDescriptor>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        use EffectOp::*;
        vec![
            FilterDescriptor::new(NONE_FILTER_ID, "Original", vec![]),
            FilterDescriptor::new("grayscale", "Grayscale", vec![Grayscale(1.0)]),
            FilterDescriptor::new("sepia", "Sepia", vec![Sepia(1.0)]),
            FilterDescriptor::new(
                "vintage",
                "Vintage",
                vec![Sepia(0.5), Contrast(1.2), Brightness(0.9)],
            ),
            FilterDescriptor::new(
                "warm",
                "Warm",
                vec![Sepia(0.3), Saturate(1.4), HueRotate(-10.0)],
            ),
            FilterDescriptor::new(
                "cool",
                "Cool",
                vec![Saturate(1.1), HueRotate(20.0), Brightness(1.05)],
            ),
            FilterDescriptor::new("vivid", "Vivid", vec![Saturate(1.6), Contrast(1.1)]),
            FilterDescriptor::new(
                "fade",
                "Fade",
                vec![Contrast(0.8), Brightness(1.1), Saturate(0.8)],
            ),
            FilterDescriptor::new(
                "noir",
                "Noir",
                vec![Grayscale(1.0), Contrast(1.4), Brightness(0.9)],
            ),
            FilterDescriptor::new("invert", "Invert", vec![Invert(1.0)]),
        ]
    })
}

/// Look up a catalog entry.
pub fn find(id: &str) -> Option<&'static FilterDescriptor> {
    catalog().iter().find(|f| f.id == id)
}

/// Effect for `id`; identity when `id` is `"none"` or unknown.
pub fn effect_of(id: &str) -> &'static EffectSpec {
    static IDENTITY: OnceLock<EffectSpec> = OnceLock::new();
    match find(id) {
        Some(descriptor) => &descriptor.effect,
        None => IDENTITY.get_or_init(EffectSpec::identity),
    }
}

/// Canonical id for a user selection: unknown ids fall back to `"none"`.
pub fn resolve_id(id: &str) -> &'static str {
    find(id).map_or(NONE_FILTER_ID, |f| f.id)
}
