// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-number overlay, drawn bottom-right with a light drop shadow.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use quire_core::error::{QuireError, Result};
use tracing::{debug, info, instrument, warn};

const SHADOW: Rgba<u8> = Rgba([200, 200, 200, 255]);
const INK: Rgba<u8> = Rgba([50, 50, 50, 255]);
const SHADOW_OFFSET: i32 = 1;

/// Expand a label template. `{n}` is the page number, `{total}` the count.
pub fn format_label(template: &str, page_number: usize, total_pages: usize) -> String {
    template
        .replace("{n}", &page_number.to_string())
        .replace("{total}", &total_pages.to_string())
}

/// A loaded font ready to stamp page numbers.
pub struct PageNumberStamp {
    font: FontVec,
}

impl PageNumberStamp {
    /// Load the font at `font_path`, falling back to the system sans-serif
    /// face. Returns `None` when neither is usable.
    #[instrument]
    pub fn load(font_path: Option<&Path>) -> Option<Self> {
        if let Some(path) = font_path {
            match std::fs::read(path) {
                Ok(data) => match Self::from_bytes(data) {
                    Ok(stamp) => {
                        info!(path = %path.display(), "Page number font loaded");
                        return Some(stamp);
                    }
                    Err(err) => warn!(path = %path.display(), %err, "Unusable page number font"),
                },
                Err(err) => warn!(path = %path.display(), %err, "Cannot read page number font"),
            }
        }
        Self::system_sans_serif()
    }

    /// Parse a TrueType/OpenType font held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        FontVec::try_from_vec(data)
            .map(|font| Self { font })
            .map_err(|err| QuireError::validation(format!("invalid font data: {err}")))
    }

    /// Wrap an already-parsed font.
    pub fn from_font(font: FontVec) -> Self {
        Self { font }
    }

    fn system_sans_serif() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let id = db.query(&fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })?;
        let face = db.face(id)?;
        let data = match &face.source {
            fontdb::Source::Binary(data) => data.as_ref().as_ref().to_vec(),
            fontdb::Source::File(path) => std::fs::read(path).ok()?,
            _ => return None,
        };
        let font = FontVec::try_from_vec_and_index(data, face.index).ok()?;
        debug!(family = ?face.families.first(), "Using system sans-serif for page numbers");
        Some(Self { font })
    }

    /// Draw `label` into the bottom-right corner of `image`.
    ///
    /// `size_pt` is scaled to pixels at `dpi`; `margin` is in pixels at
    /// 150 DPI and scaled proportionally.
    pub fn stamp(&self, image: &mut RgbaImage, label: &str, size_pt: u32, margin: u32, dpi: u32) {
        let scale = PxScale::from(size_pt as f32 * dpi as f32 / 72.0);
        let margin_px = (margin * dpi / 150) as i32;
        let (text_w, text_h) = text_size(scale, &self.font, label);
        let x = image.width() as i32 - text_w as i32 - margin_px;
        let y = image.height() as i32 - text_h as i32 - margin_px;

        draw_text_mut(
            image,
            SHADOW,
            x + SHADOW_OFFSET,
            y + SHADOW_OFFSET,
            scale,
            &self.font,
            label,
        );
        draw_text_mut(image, INK, x, y, scale, &self.font, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_expand() {
        assert_eq!(format_label("Page {n}", 3, 9), "Page 3");
        assert_eq!(format_label("{n}", 3, 9), "3");
        assert_eq!(format_label("{n} of {total}", 3, 9), "3 of 9");
    }

    #[test]
    fn custom_templates_expand_every_placeholder() {
        assert_eq!(format_label("- {n}/{total} -", 12, 40), "- 12/40 -");
        assert_eq!(format_label("folio", 1, 1), "folio");
    }

    #[test]
    fn missing_font_file_falls_back_without_panicking() {
        // Either the system sans-serif is found or the overlay is skipped.
        let _ = PageNumberStamp::load(Some(Path::new("/definitely/not/here.ttf")));
    }

    fn fixture_stamp() -> PageNumberStamp {
        let data = include_bytes!("../../testdata/DejaVuSans.ttf").to_vec();
        PageNumberStamp::from_bytes(data).unwrap()
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        assert!(PageNumberStamp::from_bytes(b"not a font".to_vec()).is_err());
    }

    #[test]
    fn configured_font_file_is_used() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/DejaVuSans.ttf");
        assert!(PageNumberStamp::load(Some(Path::new(path))).is_some());
    }

    #[test]
    fn stamp_marks_only_the_bottom_right_corner() {
        let stamp = fixture_stamp();
        let white = Rgba([255, 255, 255, 255]);
        let mut page = RgbaImage::from_pixel(850, 1100, white);
        stamp.stamp(&mut page, "Page 7", 11, 30, 100);

        let marked: Vec<(u32, u32)> = page
            .enumerate_pixels()
            .filter(|(_, _, px)| **px != white)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!marked.is_empty());
        assert!(marked.iter().all(|(x, y)| *x > 425 && *y > 550));
    }
}
