// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Histogram-based auto-enhance suggestions.

use image::RgbaImage;
use quire_core::FilterSettings;
use tracing::{debug, instrument};

const BLACK_PERCENTILE: f64 = 0.05;
const WHITE_PERCENTILE: f64 = 0.95;
/// Suggested black point never exceeds this.
const MAX_BLACK_POINT: u8 = 50;
/// Suggested white point never drops below this.
const MIN_WHITE_POINT: u8 = 205;

/// Suggest filter settings from the luminance histogram of `image`.
///
/// Levels are set from the 5th and 95th luminance percentiles. Images whose
/// histogram already spans nearly the full range get a subtle lift; the rest
/// get a modest contrast boost.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn auto_enhance_settings(image: &RgbaImage) -> FilterSettings {
    let histogram = luma_histogram(image);
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return FilterSettings::default();
    }

    let black_point = percentile(&histogram, total, BLACK_PERCENTILE).min(MAX_BLACK_POINT);
    let white_point = percentile(&histogram, total, WHITE_PERCENTILE).max(MIN_WHITE_POINT);
    let full_range = black_point <= 20 && white_point >= 235;
    let (brightness, contrast) = if full_range { (2.0, 3.0) } else { (0.0, 10.0) };

    debug!(black_point, white_point, full_range, "Auto-enhance analysis");

    FilterSettings {
        brightness,
        contrast,
        black_point,
        white_point,
        ..FilterSettings::default()
    }
}

/// Rec.601 luma histogram. Integer weights keep grey pixels exact.
fn luma_histogram(image: &RgbaImage) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for px in image.pixels() {
        let [r, g, b, _] = px.0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        histogram[luma.min(255) as usize] += 1;
    }
    histogram
}

/// Nearest-rank percentile over a histogram.
fn percentile(histogram: &[u64; 256], total: u64, fraction: f64) -> u8 {
    let rank = ((total - 1) as f64 * fraction).floor() as u64;
    let mut seen = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as u8;
        }
    }
    u8::MAX
}
