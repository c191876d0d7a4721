// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MuPDF-backed rasterizer.
//
// MuPDF documents are not thread-safe, so only the source bytes are shared;
// every render opens a fresh document on the calling thread.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use mupdf::{Colorspace, Document, Matrix};
use parking_lot::RwLock;
use quire_core::POINTS_PER_INCH;
use quire_core::error::{QuireError, Result};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::traits::Rasterizer;

const PDF_MIME: &str = "application/pdf";

/// Renders registered PDFs with MuPDF.
#[derive(Default)]
pub struct MupdfRasterizer {
    sources: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl MupdfRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `data` renderable under `document_id`. Fails when MuPDF cannot
    /// open it.
    pub fn register(&self, document_id: impl Into<String>, data: Vec<u8>) -> Result<usize> {
        let document_id = document_id.into();
        let doc = Document::from_bytes(&data, PDF_MIME)
            .map_err(|err| QuireError::Pdf(format!("MuPDF cannot open {document_id}: {err}")))?;
        let pages = doc
            .page_count()
            .map_err(|err| QuireError::Pdf(format!("MuPDF page count failed: {err}")))?
            as usize;
        info!(document_id, pages, "Document registered with rasterizer");
        self.sources.write().insert(document_id, Arc::new(data));
        Ok(pages)
    }

    pub fn unregister(&self, document_id: &str) -> bool {
        self.sources.write().remove(document_id).is_some()
    }
}

impl Rasterizer for MupdfRasterizer {
    #[instrument(skip(self))]
    fn render(&self, document_id: &str, page_index: usize, dpi: u32) -> Result<RgbaImage> {
        let data = self
            .sources
            .read()
            .get(document_id)
            .cloned()
            .ok_or_else(|| QuireError::render(page_index, format!("unknown document {document_id}")))?;

        let doc = Document::from_bytes(&data, PDF_MIME)
            .map_err(|err| QuireError::render(page_index, err))?;
        let page_count = doc
            .page_count()
            .map_err(|err| QuireError::render(page_index, err))? as usize;
        if page_index >= page_count {
            return Err(QuireError::render(
                page_index,
                format!("page index out of range (document has {page_count} pages)"),
            ));
        }

        let page = doc
            .load_page(page_index as i32)
            .map_err(|err| QuireError::render(page_index, err))?;
        let scale = dpi as f32 / POINTS_PER_INCH as f32;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|err| QuireError::render(page_index, err))?;

        let image =
            pixmap_to_rgba(&pixmap).map_err(|err| QuireError::render(page_index, err))?;
        debug!(width = image.width(), height = image.height(), "Page rasterized");
        Ok(image)
    }
}

fn pixmap_to_rgba(pixmap: &mupdf::Pixmap) -> Result<RgbaImage> {
    ImageProcessor::from_samples(
        pixmap.samples(),
        pixmap.width() as u32,
        pixmap.height() as u32,
        pixmap.n() as usize,
        pixmap.stride() as usize,
    )
    .map(ImageProcessor::into_rgba)
}
