// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble page images into a paginated PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::{Rgb, RgbImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use quire_core::POINTS_PER_INCH;
use quire_core::error::{QuireError, Result};
use tracing::{debug, info, instrument, warn};

use crate::traits::{ContainerWriter, EncodedImage};

/// Page size used to derive pages from image aspect ratios (Letter, points).
const BASE_PAGE_PT: (f64, f64) = (612.0, 792.0);
const MM_PER_INCH: f64 = 25.4;

/// Builds a PDF with one image per page.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            title: "Quire Export".to_string(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Assemble `images` into a PDF, one per page, in order.
    ///
    /// With `page_size_pt` every page takes that size and the image is placed
    /// top-left, scaled to fit with its aspect ratio. Without it each page
    /// matches its image's aspect ratio, fitted to a Letter-sized base, and
    /// the image fills the page.
    #[instrument(skip(self, images), fields(pages = images.len()))]
    pub fn assemble(
        &self,
        images: &[EncodedImage],
        page_size_pt: Option<(f64, f64)>,
    ) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(QuireError::Pdf("no images to assemble".to_string()));
        }
        info!(title = %self.title, ?page_size_pt, "Assembling PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(images.len());

        for (index, encoded) in images.iter().enumerate() {
            let rgb = flatten_onto_white(&encoded.bytes)?;
            let (img_w, img_h) = (rgb.width() as f64, rgb.height() as f64);

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: img_w as usize,
                height: img_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let (page_w, page_h) = page_size_pt.unwrap_or_else(|| fit_to_base(img_w, img_h));
            let (rect_w, rect_h) = if page_size_pt.is_some() {
                fit_rect(img_w, img_h, page_w, page_h)
            } else {
                (page_w, page_h)
            };

            // At 72 DPI one pixel is one point, so the scale is points per pixel.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt((page_h - rect_h) as f32)),
                    scale_x: Some((rect_w / img_w) as f32),
                    scale_y: Some((rect_h / img_h) as f32),
                    dpi: Some(POINTS_PER_INCH as f32),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(pt_to_mm(page_w), pt_to_mm(page_h), ops));

            debug!(index, page_w, page_h, rect_w, rect_h, "Image placed on page");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }
        Ok(output)
    }

    /// Assemble and write straight to a file.
    pub fn write_to_file(
        &self,
        images: &[EncodedImage],
        page_size_pt: Option<(f64, f64)>,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.assemble(images, page_size_pt)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl ContainerWriter for PdfWriter {
    fn assemble(
        &self,
        images: &[EncodedImage],
        page_size_pt: Option<(f64, f64)>,
    ) -> Result<Vec<u8>> {
        PdfWriter::assemble(self, images, page_size_pt)
    }
}

/// Decode and composite any transparency over white.
fn flatten_onto_white(bytes: &[u8]) -> Result<RgbImage> {
    let rgba = ::image::load_from_memory(bytes)
        .map_err(|err| QuireError::Image(format!("failed to decode image for PDF: {err}")))?
        .to_rgba8();
    Ok(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| {
            let alpha = a as u32;
            ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    }))
}

/// Page matching the image aspect ratio, fitted to the Letter base.
fn fit_to_base(img_w: f64, img_h: f64) -> (f64, f64) {
    let (base_w, base_h) = BASE_PAGE_PT;
    let aspect = img_w / img_h;
    if aspect > base_w / base_h {
        (base_w, base_w / aspect)
    } else {
        (base_h * aspect, base_h)
    }
}

/// Largest rectangle with the image aspect ratio inside the page.
fn fit_rect(img_w: f64, img_h: f64, page_w: f64, page_h: f64) -> (f64, f64) {
    let aspect = img_w / img_h;
    if aspect > page_w / page_h {
        (page_w, page_w / aspect)
    } else {
        (page_h * aspect, page_h)
    }
}

fn pt_to_mm(points: f64) -> Mm {
    Mm((points / POINTS_PER_INCH * MM_PER_INCH) as f32)
}
