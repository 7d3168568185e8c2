//! Composable color effects with CSS Filter Effects semantics.
//!
//! Each [`EffectOp`] matches the browser filter function of the same name,
//! so the on-screen preview (rendered with [`EffectSpec::to_css`]) and the
//! rasterized output agree. Ops are applied in order on normalized RGB and
//! the result is clamped to [0, 1] after every op, as a browser does when it
//! chains filter functions.

use serde::{Deserialize, Serialize};

/// ITU-R BT.709 luminance coefficients, as used by the CSS filter matrices.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

type Matrix = [[f32; 3]; 3];

/// One filter function.
///
/// Amounts follow CSS: `1.0` is the full effect for grayscale/sepia/invert,
/// and the unchanged image for saturate/contrast/brightness. Hue rotation
/// is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "amount", rename_all = "kebab-case")]
pub enum EffectOp {
    Grayscale(f32),
    Sepia(f32),
    Saturate(f32),
    Contrast(f32),
    Brightness(f32),
    HueRotate(f32),
    Invert(f32),
}

impl EffectOp {
    #[inline]
    fn apply(self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        match self {
            EffectOp::Contrast(c) => (
                (r - 0.5) * c + 0.5,
                (g - 0.5) * c + 0.5,
                (b - 0.5) * c + 0.5,
            ),
            EffectOp::Brightness(k) => (r * k, g * k, b * k),
            EffectOp::Invert(a) => {
                let a = a.clamp(0.0, 1.0);
                (
                    a * (1.0 - r) + (1.0 - a) * r,
                    a * (1.0 - g) + (1.0 - a) * g,
                    a * (1.0 - b) + (1.0 - a) * b,
                )
            }
            op => {
                let m = op.matrix();
                (
                    m[0][0] * r + m[0][1] * g + m[0][2] * b,
                    m[1][0] * r + m[1][1] * g + m[1][2] * b,
                    m[2][0] * r + m[2][1] * g + m[2][2] * b,
                )
            }
        }
    }

    /// Color matrix for the matrix-based ops; identity for the rest.
    fn matrix(self) -> Matrix {
        match self {
            EffectOp::Grayscale(a) => {
                let k = 1.0 - a.clamp(0.0, 1.0);
                [
                    [LUMA_R + (1.0 - LUMA_R) * k, LUMA_G - LUMA_G * k, LUMA_B - LUMA_B * k],
                    [LUMA_R - LUMA_R * k, LUMA_G + (1.0 - LUMA_G) * k, LUMA_B - LUMA_B * k],
                    [LUMA_R - LUMA_R * k, LUMA_G - LUMA_G * k, LUMA_B + (1.0 - LUMA_B) * k],
                ]
            }
            EffectOp::Sepia(a) => {
                let k = 1.0 - a.clamp(0.0, 1.0);
                [
                    [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
                    [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
                    [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
                ]
            }
            EffectOp::Saturate(s) => {
                let s = s.max(0.0);
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ]
            }
            EffectOp::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                [
                    [
                        0.213 + cos * 0.787 - sin * 0.213,
                        0.715 - cos * 0.715 - sin * 0.715,
                        0.072 - cos * 0.072 + sin * 0.928,
                    ],
                    [
                        0.213 - cos * 0.213 + sin * 0.143,
                        0.715 + cos * 0.285 + sin * 0.140,
                        0.072 - cos * 0.072 - sin * 0.283,
                    ],
                    [
                        0.213 - cos * 0.213 - sin * 0.787,
                        0.715 - cos * 0.715 + sin * 0.715,
                        0.072 + cos * 0.928 + sin * 0.072,
                    ],
                ]
            }
            _ => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    fn to_css(self) -> String {
        match self {
            EffectOp::Grayscale(a) => format!("grayscale({a})"),
            EffectOp::Sepia(a) => format!("sepia({a})"),
            EffectOp::Saturate(a) => format!("saturate({a})"),
            EffectOp::Contrast(a) => format!("contrast({a})"),
            EffectOp::Brightness(a) => format!("brightness({a})"),
            EffectOp::HueRotate(deg) => format!("hue-rotate({deg}deg)"),
            EffectOp::Invert(a) => format!("invert({a})"),
        }
    }
}

/// Ordered list of ops; empty means identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub ops: Vec<EffectOp>,
}

impl EffectSpec {
    pub fn new(ops: Vec<EffectOp>) -> Self {
        Self { ops }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the effect in place to packed RGB pixel data.
    pub fn apply(&self, pixels: &mut [u8]) {
        if self.is_identity() {
            return;
        }

        for chunk in pixels.chunks_exact_mut(3) {
            let mut r = chunk[0] as f32 / 255.0;
            let mut g = chunk[1] as f32 / 255.0;
            let mut b = chunk[2] as f32 / 255.0;

            for op in &self.ops {
                let (nr, ng, nb) = op.apply(r, g, b);
                r = nr.clamp(0.0, 1.0);
                g = ng.clamp(0.0, 1.0);
                b = nb.clamp(0.0, 1.0);
            }

            chunk[0] = (r * 255.0).round() as u8;
            chunk[1] = (g * 255.0).round() as u8;
            chunk[2] = (b * 255.0).round() as u8;
        }
    }

    /// CSS `filter` value rendering the same effect, for on-screen preview.
    pub fn to_css(&self) -> String {
        if self.is_identity() {
            return "none".to_string();
        }
        self.ops
            .iter()
            .map(|op| op.to_css())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
