// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet composition: two pages side by side on a landscape canvas.

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use quire_core::{PaperSize, VerticalAlign};
use tracing::{debug, instrument};

use super::plan::{Sheet, Slot};
use crate::image::processor::ImageProcessor;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Pixel size of one composed sheet side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetCanvas {
    pub width: u32,
    pub height: u32,
}

impl SheetCanvas {
    /// `target` turned landscape at `dpi`: its height becomes the canvas
    /// width and its width the canvas height.
    pub fn landscape(target: &PaperSize, dpi: u32) -> Self {
        let (width, height) = target.pixels_at(dpi);
        Self {
            width: height,
            height: width,
        }
    }

    /// Width of the left half. The right half takes the remainder.
    pub fn half_width(&self) -> u32 {
        self.width / 2
    }
}

/// Compose one sheet side from a left and a right page. `None` leaves that
/// half blank.
///
/// Each page is scaled (Lanczos3, aspect preserved) to fit its half,
/// centered horizontally within the half, and placed vertically per `align`.
#[instrument(skip(left, right), fields(width = canvas.width, height = canvas.height))]
pub fn compose(
    left: Option<&RgbaImage>,
    right: Option<&RgbaImage>,
    canvas: SheetCanvas,
    align: VerticalAlign,
) -> RgbaImage {
    let mut sheet = RgbaImage::from_pixel(canvas.width, canvas.height, BACKGROUND);
    let half = canvas.half_width();
    let halves = [(left, 0, half), (right, half, canvas.width - half)];

    for (page, x0, half_w) in halves {
        let Some(page) = page else { continue };
        if half_w == 0 || canvas.height == 0 {
            continue;
        }
        let fitted = ImageProcessor::from_rgba(page.clone())
            .fit_within(half_w, canvas.height)
            .into_rgba();
        let x = x0 + (half_w - fitted.width()) / 2;
        let y = match align {
            VerticalAlign::Top => 0,
            VerticalAlign::Center => (canvas.height - fitted.height()) / 2,
        };
        image::imageops::overlay(&mut sheet, &fitted, i64::from(x), i64::from(y));
    }

    debug!(
        left = left.is_some(),
        right = right.is_some(),
        "Sheet side composed"
    );
    sheet
}

/// Compose every side of `sheet`, front first.
///
/// `pages` maps logical page numbers (as stored in the slots) to their
/// processed images. A page with no image renders blank.
pub fn compose_sheet(
    sheet: &Sheet,
    pages: &BTreeMap<usize, RgbaImage>,
    canvas: SheetCanvas,
    align: VerticalAlign,
) -> Vec<RgbaImage> {
    let lookup = |slot: Slot| slot.page().and_then(|n| pages.get(&n));
    sheet
        .sides()
        .into_iter()
        .map(|(left, right)| compose(lookup(left), lookup(right), canvas, align))
        .collect()
}
