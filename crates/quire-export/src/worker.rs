// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blocking per-page work: cache lookups, rasterization, filtering, overlays.
//
// Everything here runs inside `spawn_blocking`; the orchestrator owns the
// async side (timeouts, cancellation, ordering).

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use quire_cache::{FingerprintKey, PageCache, PutOutcome};
use quire_core::error::{QuireError, Result};
use quire_core::{FilterSettings, PageNumbering};
use quire_document::{
    FilterPipeline, HorizontalSide, ImageProcessor, PageNumberStamp, Rasterizer, format_label,
    pad_to_size,
};
use tracing::{debug, warn};

/// Shared handles a blocking page job needs. Cheap to clone.
#[derive(Clone)]
pub(crate) struct PageWorker {
    pub(crate) cache: Arc<PageCache>,
    pub(crate) rasterizer: Arc<dyn Rasterizer>,
}

/// Page-number overlay for one page.
#[derive(Clone)]
pub(crate) struct NumberOverlay {
    pub(crate) stamp: Arc<PageNumberStamp>,
    pub(crate) numbering: PageNumbering,
    pub(crate) total_pages: usize,
}

/// Exact-size padding for one page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PadOverlay {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) side: HorizontalSide,
}

/// Everything needed to produce one export page.
#[derive(Clone)]
pub(crate) struct PageTask {
    pub(crate) document_id: String,
    pub(crate) page_index: usize,
    pub(crate) dpi: u32,
    pub(crate) filters: Option<FilterSettings>,
    pub(crate) number: Option<NumberOverlay>,
    pub(crate) pad: Option<PadOverlay>,
}

impl PageWorker {
    // -- Cached stages --------------------------------------------------------

    /// Raw render of a page, from the rendered tier when possible.
    pub(crate) fn rendered(&self, document_id: &str, page_index: usize, dpi: u32) -> Result<RgbaImage> {
        let key = FingerprintKey::rendered(document_id, page_index, dpi);
        if let Some(image) = self.lookup(&key) {
            return Ok(image);
        }

        let image = self.rasterizer.render(document_id, page_index, dpi)?;
        debug!(%key, width = image.width(), height = image.height(), "Page rendered");
        self.store(key, &image);
        Ok(image)
    }

    /// Filtered page, from the filtered tier when possible. Default settings
    /// skip the filter stage and its tier entirely.
    pub(crate) fn filtered(
        &self,
        document_id: &str,
        page_index: usize,
        dpi: u32,
        settings: &FilterSettings,
    ) -> Result<RgbaImage> {
        if settings.is_default() {
            return self.rendered(document_id, page_index, dpi);
        }

        let key = FingerprintKey::filtered(document_id, page_index, dpi, settings);
        if let Some(image) = self.lookup(&key) {
            return Ok(image);
        }

        let base = self.rendered(document_id, page_index, dpi)?;
        let image = FilterPipeline::apply(&base, settings)?;
        self.store(key, &image);
        Ok(image)
    }

    // -- Export page ----------------------------------------------------------

    /// Render, filter, number, then pad one page, in that order.
    pub(crate) fn process(&self, task: &PageTask) -> Result<RgbaImage> {
        let mut image = match &task.filters {
            Some(settings) => {
                self.filtered(&task.document_id, task.page_index, task.dpi, settings)?
            }
            None => self.rendered(&task.document_id, task.page_index, task.dpi)?,
        };

        if let Some(overlay) = &task.number {
            let label = format_label(
                &overlay.numbering.format,
                task.page_index + 1,
                overlay.total_pages,
            );
            overlay.stamp.stamp(
                &mut image,
                &label,
                overlay.numbering.size_pt,
                overlay.numbering.margin,
                task.dpi,
            );
        }

        if let Some(pad) = task.pad {
            image = pad_to_size(&image, pad.width, pad.height, pad.side);
        }

        Ok(image)
    }

    // -- Cache plumbing -------------------------------------------------------

    /// Decoded cache entry. An undecodable payload counts as a miss.
    fn lookup(&self, key: &FingerprintKey) -> Option<RgbaImage> {
        let payload = self.cache.get(key)?;
        match ImageProcessor::from_bytes(&payload) {
            Ok(processor) => {
                debug!(%key, "Cache hit");
                Some(processor.into_rgba())
            }
            Err(err) => {
                warn!(%key, %err, "Cached payload unreadable; re-rendering");
                None
            }
        }
    }

    /// Store `image` as PNG. Failures are logged and otherwise ignored.
    fn store(&self, key: FingerprintKey, image: &RgbaImage) {
        let payload = match ImageProcessor::from_rgba(image.clone()).to_png_bytes() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%key, %err, "Cannot encode page for cache");
                return;
            }
        };
        match self.cache.put(key, payload) {
            Ok(PutOutcome::Stored { evicted }) => debug!(evicted, "Cached page"),
            Ok(PutOutcome::Oversized { evicted }) => {
                debug!(evicted, "Cached oversized page")
            }
            Err(err) => warn!(%err, "Cache put failed; continuing uncached"),
        }
    }
}

/// Run `job` on the blocking pool, bounded by `limit`.
///
/// A timeout or a panicking job becomes a render error for `page_index`.
pub(crate) async fn run_blocking<T, F>(page_index: usize, limit: Duration, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(QuireError::render(
            page_index,
            format!("page task failed: {err}"),
        )),
        Err(_) => Err(QuireError::render(
            page_index,
            format!("timed out after {}s", limit.as_secs()),
        )),
    }
}
