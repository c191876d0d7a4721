// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered filter pipeline.
//
// Stage order is fixed: exposure, brightness, contrast, shadows, midtones,
// highlights, saturation, vibrance, levels (with gamma), sharpen. Each stage
// sees the previous stage's output. Neutral stages are left out entirely.

use image::{DynamicImage, Rgba, Rgba32FImage, RgbaImage};
use quire_core::FilterSettings;
use quire_core::error::Result;
use tracing::{debug, instrument};

use super::stages::Stage;

/// The stages a set of `FilterSettings` expands to, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl FilterPipeline {
    /// Build the pipeline for already-validated settings.
    pub fn from_settings(settings: &FilterSettings) -> Self {
        let s = settings;
        let mut stages = Vec::new();
        if s.exposure != 0.0 {
            stages.push(Stage::Exposure {
                stops: s.exposure as f32,
            });
        }
        if s.brightness != 0.0 {
            stages.push(Stage::Brightness {
                amount: s.brightness as f32,
            });
        }
        if s.contrast != 0.0 {
            stages.push(Stage::Contrast {
                amount: s.contrast as f32,
            });
        }
        if s.shadows != 0.0 {
            stages.push(Stage::Shadows {
                amount: s.shadows as f32,
            });
        }
        if s.midtones != 0.0 {
            stages.push(Stage::Midtones {
                amount: s.midtones as f32,
            });
        }
        if s.highlights != 0.0 {
            stages.push(Stage::Highlights {
                amount: s.highlights as f32,
            });
        }
        if s.saturation != 0.0 {
            stages.push(Stage::Saturation {
                amount: s.saturation as f32,
            });
        }
        if s.vibrance != 0.0 {
            stages.push(Stage::Vibrance {
                amount: s.vibrance as f32,
            });
        }
        if s.black_point != 0 || s.white_point != 255 || s.gamma != 1.0 {
            stages.push(Stage::Levels {
                black: s.black_point,
                white: s.white_point,
                gamma: s.gamma as f32,
            });
        }
        if s.sharpness != 0.0 {
            stages.push(Stage::Sharpen {
                amount: s.sharpness as f32,
            });
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    /// Validate `settings` and apply them to `image`.
    ///
    /// The input is never modified. Default settings return a copy of the
    /// input without running any stage.
    #[instrument(skip(image, settings), fields(width = image.width(), height = image.height()))]
    pub fn apply(image: &RgbaImage, settings: &FilterSettings) -> Result<RgbaImage> {
        settings.validate()?;
        if settings.is_default() {
            return Ok(image.clone());
        }
        Ok(Self::from_settings(settings).run(image))
    }

    /// Run every stage in order on a copy of `image`.
    pub fn run(&self, image: &RgbaImage) -> RgbaImage {
        if self.is_identity() {
            return image.clone();
        }
        let mut pixels = DynamicImage::ImageRgba8(image.clone()).to_rgba32f();
        for stage in &self.stages {
            debug!(stage = stage.name(), "Applying filter stage");
            pixels = stage.apply(pixels);
        }
        to_rgba8(&pixels)
    }
}

fn to_rgba8(pixels: &Rgba32FImage) -> RgbaImage {
    RgbaImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([q(r), q(g), q(b), q(a)])
    })
}

#[cfg(test)]
mod tests {
    use quire_core::QuireError;

    use super::*;

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(24, 16, |x, y| {
            Rgba([(x * 10) as u8, (y * 15) as u8, ((x + y) * 6) as u8, 200])
        })
    }

    fn busy_settings() -> FilterSettings {
        FilterSettings {
            brightness: 12.0,
            contrast: -8.0,
            highlights: 15.0,
            midtones: -10.0,
            shadows: 5.0,
            exposure: 0.5,
            saturation: 20.0,
            vibrance: 30.0,
            sharpness: 40.0,
            black_point: 8,
            white_point: 245,
            gamma: 1.2,
        }
    }

    #[test]
    fn default_settings_are_pixel_identical() {
        let input = gradient();
        let output = FilterPipeline::apply(&input, &FilterSettings::default()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn neutral_stages_are_skipped() {
        let pipeline = FilterPipeline::from_settings(&FilterSettings::default());
        assert!(pipeline.is_identity());
    }

    #[test]
    fn stages_follow_the_fixed_order() {
        let names: Vec<_> = FilterPipeline::from_settings(&busy_settings())
            .stages()
            .iter()
            .map(Stage::name)
            .collect();
        assert_eq!(
            names,
            [
                "exposure",
                "brightness",
                "contrast",
                "shadows",
                "midtones",
                "highlights",
                "saturation",
                "vibrance",
                "levels",
                "sharpen",
            ]
        );
    }

    #[test]
    fn repeated_application_is_deterministic() {
        let input = gradient();
        let a = FilterPipeline::apply(&input, &busy_settings()).unwrap();
        let b = FilterPipeline::apply(&input, &busy_settings()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn order_matters() {
        // Contrast then brightness is not the same as brightness then contrast.
        let input = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));
        let forward = FilterPipeline::apply(
            &input,
            &FilterSettings {
                brightness: 20.0,
                contrast: 50.0,
                ..FilterSettings::default()
            },
        )
        .unwrap();
        let pixels = DynamicImage::ImageRgba8(input).to_rgba32f();
        let swapped = Stage::Brightness { amount: 20.0 }
            .apply(Stage::Contrast { amount: 50.0 }.apply(pixels));
        assert_ne!(forward, to_rgba8(&swapped));
    }

    #[test]
    fn brightness_lightens_mid_grey() {
        let input = RgbaImage::from_pixel(3, 3, Rgba([128, 128, 128, 255]));
        let output = FilterPipeline::apply(
            &input,
            &FilterSettings {
                brightness: 10.0,
                ..FilterSettings::default()
            },
        )
        .unwrap();
        // 128 + 0.05 * 255 = 140.75
        assert_eq!(*output.get_pixel(1, 1), Rgba([141, 141, 141, 255]));
    }

    #[test]
    fn alpha_is_preserved() {
        let output = FilterPipeline::apply(&gradient(), &busy_settings()).unwrap();
        assert!(output.pixels().all(|px| px.0[3] == 200));
    }

    #[test]
    fn invalid_settings_are_rejected_before_filtering() {
        let settings = FilterSettings {
            gamma: 5.0,
            ..FilterSettings::default()
        };
        assert!(matches!(
            FilterPipeline::apply(&gradient(), &settings),
            Err(QuireError::Validation(_))
        ));
    }
}
