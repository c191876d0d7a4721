// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Individual tonal and colour stages.
//
// Every stage works on normalised [0, 1] RGB floats, clamps its output, and
// leaves alpha untouched.

use image::Rgba32FImage;

/// Rec.601 luma.
pub(crate) fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// One pure transform in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Multiply by `2^stops`.
    Exposure { stops: f32 },
    /// Add `amount / 100 * 0.5`.
    Brightness { amount: f32 },
    /// Scale around 0.5 by `1 + amount / 100`.
    Contrast { amount: f32 },
    /// Add `amount / 100`, weighted towards dark pixels by `1 - L`.
    Shadows { amount: f32 },
    /// Gain `1 + amount / 100`, weighted by a bell curve around L = 0.5.
    Midtones { amount: f32 },
    /// Gain `1 + amount / 100`, weighted towards bright pixels by `L^2`.
    Highlights { amount: f32 },
    /// Scale chroma around luma by `1 + amount / 100`.
    Saturation { amount: f32 },
    /// Saturation boost that favours muted pixels and spares skin tones.
    Vibrance { amount: f32 },
    /// Remap `[black, white]` to `[0, 1]`, then apply `x^(1/gamma)`.
    Levels { black: u8, white: u8, gamma: f32 },
    /// Unsharp mask (Gaussian sigma 1.0) scaled by `amount / 100`.
    Sharpen { amount: f32 },
}

const SHARPEN_SIGMA: f32 = 1.0;

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exposure { .. } => "exposure",
            Self::Brightness { .. } => "brightness",
            Self::Contrast { .. } => "contrast",
            Self::Shadows { .. } => "shadows",
            Self::Midtones { .. } => "midtones",
            Self::Highlights { .. } => "highlights",
            Self::Saturation { .. } => "saturation",
            Self::Vibrance { .. } => "vibrance",
            Self::Levels { .. } => "levels",
            Self::Sharpen { .. } => "sharpen",
        }
    }

    /// Apply the stage, consuming the input buffer.
    pub fn apply(&self, mut pixels: Rgba32FImage) -> Rgba32FImage {
        match *self {
            Self::Sharpen { amount } => return unsharp_mask(pixels, amount / 100.0),
            stage => {
                for px in pixels.pixels_mut() {
                    let [r, g, b, a] = px.0;
                    let [r, g, b] = stage.map_rgb(r, g, b);
                    px.0 = [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), a];
                }
            }
        }
        pixels
    }

    fn map_rgb(&self, r: f32, g: f32, b: f32) -> [f32; 3] {
        match *self {
            Self::Exposure { stops } => {
                let gain = 2f32.powf(stops);
                [r * gain, g * gain, b * gain]
            }
            Self::Brightness { amount } => {
                let offset = amount / 100.0 * 0.5;
                [r + offset, g + offset, b + offset]
            }
            Self::Contrast { amount } => {
                let gain = 1.0 + amount / 100.0;
                let f = |c: f32| (c - 0.5) * gain + 0.5;
                [f(r), f(g), f(b)]
            }
            Self::Shadows { amount } => {
                let lift = amount / 100.0 * (1.0 - luma(r, g, b));
                [r + lift, g + lift, b + lift]
            }
            Self::Midtones { amount } => {
                let l = luma(r, g, b);
                let gain = 1.0 + amount / 100.0 * (-4.0 * (l - 0.5).powi(2)).exp();
                [r * gain, g * gain, b * gain]
            }
            Self::Highlights { amount } => {
                let l = luma(r, g, b);
                let gain = 1.0 + amount / 100.0 * l * l;
                [r * gain, g * gain, b * gain]
            }
            Self::Saturation { amount } => {
                let l = luma(r, g, b);
                let gain = 1.0 + amount / 100.0;
                let f = |c: f32| l + (c - l) * gain;
                [f(r), f(g), f(b)]
            }
            Self::Vibrance { amount } => vibrance(r, g, b, amount / 100.0),
            Self::Levels {
                black,
                white,
                gamma,
            } => {
                let (black, white) = (black as f32, white as f32);
                let f = |c: f32| {
                    let level = ((c * 255.0 - black) / (white - black)).clamp(0.0, 1.0);
                    level.powf(1.0 / gamma)
                };
                [f(r), f(g), f(b)]
            }
            Self::Sharpen { .. } => [r, g, b],
        }
    }
}

/// Scale HSV saturation by `1 + factor * (1 - S)`, halving the boost for
/// skin-like hues (r >= g >= b). Hue and value are preserved.
fn vibrance(r: f32, g: f32, b: f32, factor: f32) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max <= 0.0 || max == min {
        return [r, g, b];
    }
    let saturation = (max - min) / max;
    let protect = if r >= g && g >= b { 0.5 } else { 1.0 };
    let boosted = (saturation * (1.0 + factor * protect * (1.0 - saturation))).clamp(0.0, 1.0);
    let ratio = boosted / saturation;
    let f = |c: f32| max - (max - c) * ratio;
    [f(r), f(g), f(b)]
}

fn unsharp_mask(pixels: Rgba32FImage, amount: f32) -> Rgba32FImage {
    let blurred = image::imageops::blur(&pixels, SHARPEN_SIGMA);
    let mut out = pixels;
    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for channel in 0..3 {
            let c = px.0[channel];
            px.0[channel] = (c + amount * (c - soft.0[channel])).clamp(0.0, 1.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn solid(r: f32, g: f32, b: f32) -> Rgba32FImage {
        Rgba32FImage::from_pixel(4, 4, Rgba([r, g, b, 0.75]))
    }

    fn first(img: &Rgba32FImage) -> [f32; 4] {
        img.get_pixel(0, 0).0
    }

    #[test]
    fn exposure_doubles_per_stop() {
        let out = Stage::Exposure { stops: 1.0 }.apply(solid(0.2, 0.3, 0.4));
        let [r, g, b, _] = first(&out);
        assert!((r - 0.4).abs() < 1e-6 && (g - 0.6).abs() < 1e-6 && (b - 0.8).abs() < 1e-6);
    }

    #[test]
    fn brightness_offsets_and_clamps() {
        let out = Stage::Brightness { amount: 10.0 }.apply(solid(0.5, 0.98, 0.0));
        let [r, g, b, _] = first(&out);
        assert!((r - 0.55).abs() < 1e-6);
        assert_eq!(g, 1.0);
        assert!((b - 0.05).abs() < 1e-6);
    }

    #[test]
    fn contrast_pivots_on_mid_grey() {
        let out = Stage::Contrast { amount: 50.0 }.apply(solid(0.5, 0.7, 0.3));
        let [r, g, b, _] = first(&out);
        assert!((r - 0.5).abs() < 1e-6);
        assert!((g - 0.8).abs() < 1e-6);
        assert!((b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn shadows_lift_dark_more_than_light() {
        let dark = first(&Stage::Shadows { amount: 20.0 }.apply(solid(0.1, 0.1, 0.1)));
        let light = first(&Stage::Shadows { amount: 20.0 }.apply(solid(0.9, 0.9, 0.9)));
        assert!(dark[0] - 0.1 > light[0] - 0.9);
    }

    #[test]
    fn highlights_leave_black_alone() {
        let out = Stage::Highlights { amount: 80.0 }.apply(solid(0.0, 0.0, 0.0));
        assert_eq!(&first(&out)[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_saturation_collapses_to_luma() {
        let out = Stage::Saturation { amount: -100.0 }.apply(solid(0.9, 0.2, 0.1));
        let [r, g, b, _] = first(&out);
        assert!((r - g).abs() < 1e-6 && (g - b).abs() < 1e-6);
    }

    #[test]
    fn vibrance_boosts_muted_more_than_vivid() {
        // Neither pixel is skin-like (blue dominates).
        let muted_in = solid(0.4, 0.45, 0.5);
        let vivid_in = solid(0.05, 0.1, 0.9);
        let s = |px: [f32; 4]| {
            let max = px[0].max(px[1]).max(px[2]);
            let min = px[0].min(px[1]).min(px[2]);
            (max - min) / max
        };
        let muted_gain = s(first(&Stage::Vibrance { amount: 100.0 }.apply(muted_in.clone())))
            / s(first(&muted_in));
        let vivid_gain = s(first(&Stage::Vibrance { amount: 100.0 }.apply(vivid_in.clone())))
            / s(first(&vivid_in));
        assert!(muted_gain > vivid_gain);
    }

    #[test]
    fn vibrance_leaves_greys_untouched() {
        let out = Stage::Vibrance { amount: 100.0 }.apply(solid(0.4, 0.4, 0.4));
        assert_eq!(&first(&out)[..3], &[0.4, 0.4, 0.4]);
    }

    #[test]
    fn levels_stretch_the_input_range() {
        let stage = Stage::Levels {
            black: 51,
            white: 204,
            gamma: 1.0,
        };
        let out = stage.apply(solid(0.2, 0.8, 0.5));
        let [r, g, b, _] = first(&out);
        assert!(r.abs() < 1e-6);
        assert!((g - 1.0).abs() < 1e-6);
        assert!((b - 0.5).abs() < 1e-3);
    }

    #[test]
    fn gamma_above_one_brightens_midtones() {
        let stage = Stage::Levels {
            black: 0,
            white: 255,
            gamma: 2.0,
        };
        let [r, ..] = first(&stage.apply(solid(0.25, 0.25, 0.25)));
        assert!((r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sharpen_leaves_flat_regions_alone() {
        let out = Stage::Sharpen { amount: 100.0 }.apply(solid(0.3, 0.6, 0.9));
        let [r, g, b, _] = first(&out);
        assert!((r - 0.3).abs() < 1e-4 && (g - 0.6).abs() < 1e-4 && (b - 0.9).abs() < 1e-4);
    }

    #[test]
    fn alpha_survives_every_stage() {
        let stages = [
            Stage::Exposure { stops: 2.0 },
            Stage::Brightness { amount: 50.0 },
            Stage::Contrast { amount: -50.0 },
            Stage::Shadows { amount: 30.0 },
            Stage::Midtones { amount: 30.0 },
            Stage::Highlights { amount: 30.0 },
            Stage::Saturation { amount: 30.0 },
            Stage::Vibrance { amount: 30.0 },
            Stage::Levels {
                black: 10,
                white: 240,
                gamma: 1.5,
            },
            Stage::Sharpen { amount: 50.0 },
        ];
        for stage in stages {
            let out = stage.apply(solid(0.3, 0.5, 0.7));
            assert_eq!(first(&out)[3], 0.75, "{} touched alpha", stage.name());
        }
    }
}
