// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestrator: the single entry point for previews and exports.
//
// Holds the document registry, the two-tier page cache, and the collaborators
// (rasterizer, encoder, container writer). All CPU-heavy work is pushed onto
// the blocking pool; the async side enforces the per-render timeout, checks
// cancellation between pages, and keeps output in sheet/page order.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use image::RgbaImage;
use parking_lot::RwLock;
use quire_cache::{PageCache, PageCacheStats};
use quire_core::error::{QuireError, Result};
use quire_core::{
    DocumentInfo, DpiPolicy, ErrorClass, ExportSpec, FilterSettings, ImageFormat, QuireConfig,
};
use quire_document::impose::compose_sheet;
use quire_document::{
    ContainerWriter, EncodedImage, HorizontalSide, ImageEncoder, PageNumberStamp, PdfWriter,
    Rasterizer, SheetCanvas, StandardEncoder, plan,
};
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::report::{ExportReport, PageFailure};
use crate::worker::{NumberOverlay, PadOverlay, PageTask, PageWorker, run_blocking};

/// Upper bound on one page's blocking work (render through padding).
const RENDER_TIMEOUT_SECS: u64 = 30;

/// Drives pages through render, filter, overlay, and imposition.
pub struct Orchestrator {
    worker: PageWorker,
    encoder: Arc<dyn ImageEncoder>,
    writer: Arc<dyn ContainerWriter>,
    documents: RwLock<HashMap<String, DocumentInfo>>,
    dpi_policy: DpiPolicy,
    font_path: Option<PathBuf>,
    /// Loaded on first use; `Some(None)` records that no font was found.
    stamp: OnceLock<Option<Arc<PageNumberStamp>>>,
    render_timeout: Duration,
}

impl Orchestrator {
    // -- Construction ---------------------------------------------------------

    /// Orchestrator with cache budgets and DPI policy from `config`, PNG/JPEG
    /// encoding, and PDF assembly.
    pub fn new(config: &QuireConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        info!(
            rendered_budget = config.rendered_cache_budget_bytes,
            filtered_budget = config.filtered_cache_budget_bytes,
            "Creating orchestrator"
        );
        Self {
            worker: PageWorker {
                cache: Arc::new(PageCache::from_config(config)),
                rasterizer,
            },
            encoder: Arc::new(StandardEncoder),
            writer: Arc::new(PdfWriter::new()),
            documents: RwLock::new(HashMap::new()),
            dpi_policy: config.dpi_policy(),
            font_path: config.page_number_font.clone(),
            stamp: OnceLock::new(),
            render_timeout: Duration::from_secs(RENDER_TIMEOUT_SECS),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn ContainerWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Use `stamp` for page numbers instead of loading a font on demand.
    pub fn with_page_number_stamp(mut self, stamp: PageNumberStamp) -> Self {
        self.stamp = OnceLock::from(Some(Arc::new(stamp)));
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    // -- Registry -------------------------------------------------------------

    /// Make a document available for preview and export.
    pub fn register(&self, info: DocumentInfo) {
        info!(document_id = %info.id, pages = info.page_count, "Document registered");
        if self.documents.write().insert(info.id.clone(), info).is_some() {
            debug!("Replaced existing registration");
        }
    }

    /// Registered document, or a validation error when unknown.
    pub fn document(&self, document_id: &str) -> Result<DocumentInfo> {
        self.documents
            .read()
            .get(document_id)
            .cloned()
            .ok_or_else(|| QuireError::validation(format!("unknown document {document_id}")))
    }

    /// Forget a document and drop its cache entries.
    pub fn remove(&self, document_id: &str) -> bool {
        let removed = self.documents.write().remove(document_id).is_some();
        self.clear(document_id);
        removed
    }

    // -- Cache management -----------------------------------------------------

    /// Drop every cached page of `document_id` in both tiers.
    pub fn clear(&self, document_id: &str) -> usize {
        let removed = self.worker.cache.clear(document_id);
        info!(document_id, removed, "Cleared cached pages");
        removed
    }

    pub fn clear_all(&self) {
        self.worker.cache.clear_all();
        info!("Cleared page cache");
    }

    pub fn stats(&self) -> PageCacheStats {
        self.worker.cache.stats()
    }

    // -- Preview --------------------------------------------------------------

    /// Render one page for display, filtered and encoded.
    ///
    /// The DPI is derived from the page height so the preview lands near the
    /// configured display height. Both the raw render and the filtered result
    /// are cached.
    #[instrument(skip(self, settings))]
    pub async fn preview(
        &self,
        document_id: &str,
        page_index: usize,
        settings: &FilterSettings,
        format: ImageFormat,
        quality: u8,
    ) -> Result<EncodedImage> {
        settings.validate()?;
        validate_quality(quality)?;
        let info = self.document(document_id)?;
        let dimensions = info.page(page_index)?;
        let dpi = self.dpi_policy.preview_dpi(dimensions.height_in());

        let worker = self.worker.clone();
        let encoder = Arc::clone(&self.encoder);
        let id = info.id.clone();
        let settings = *settings;
        let encoded = run_blocking(page_index, self.render_timeout, move || {
            let image = worker.filtered(&id, page_index, dpi, &settings)?;
            encoder.encode(&image, format, quality)
        })
        .await?;

        info!(
            dpi,
            width = encoded.width,
            height = encoded.height,
            "Preview rendered"
        );
        Ok(encoded)
    }

    // -- Export ---------------------------------------------------------------

    /// Produce the output images for `document_id`.
    ///
    /// Everything that can be validated is validated before the first page is
    /// rendered. A page that fails to render or encode is recorded in the
    /// report (and left blank on its sheet for 2-up); the other pages still
    /// come out. Cancellation is honoured before each page and each sheet.
    /// Composed sheets are never cached.
    #[instrument(skip(self, page_filters, spec, cancel), fields(two_up = spec.two_up))]
    pub async fn export(
        &self,
        document_id: &str,
        page_filters: &HashMap<usize, FilterSettings>,
        spec: &ExportSpec,
        cancel: &CancelToken,
    ) -> Result<ExportReport> {
        let info = self.document(document_id)?;
        let mut tasks = self.page_tasks(&info, page_filters, spec)?;
        let sheets = if spec.two_up {
            Some(plan(info.page_count, spec.layout_mode, spec.start_page)?)
        } else {
            None
        };

        let number = match &spec.page_numbers {
            Some(numbering) => self.page_number_stamp().await.map(|stamp| NumberOverlay {
                stamp,
                numbering: numbering.clone(),
                total_pages: info.page_count,
            }),
            None => None,
        };

        info!(
            document_id,
            pages = tasks.len(),
            sheets = sheets.as_ref().map_or(0, Vec::len),
            "Export started"
        );

        let mut report = ExportReport {
            page_size_pt: output_page_size(spec),
            ..ExportReport::default()
        };
        let first_index = spec.start_page - 1;
        let mut processed: BTreeMap<usize, RgbaImage> = BTreeMap::new();

        for task in &mut tasks {
            if cancel.is_cancelled() {
                warn!(page_index = task.page_index, "Export cancelled");
                return Err(QuireError::Cancelled);
            }
            task.number = number.clone();
            let page_index = task.page_index;

            let worker = self.worker.clone();
            let job = task.clone();
            let image = match run_blocking(page_index, self.render_timeout, move || {
                worker.process(&job)
            })
            .await
            {
                Ok(image) => image,
                Err(err) => {
                    self.record_failure(&mut report, page_index, err)?;
                    continue;
                }
            };

            if sheets.is_some() {
                // Slots hold logical page numbers counted from the start page.
                processed.insert(page_index - first_index + 1, image);
                continue;
            }

            let encoder = Arc::clone(&self.encoder);
            let (format, quality) = (spec.image_format, spec.quality);
            match run_blocking(page_index, self.render_timeout, move || {
                encoder.encode(&image, format, quality)
            })
            .await
            {
                Ok(encoded) => report.images.push(encoded),
                Err(err) => self.record_failure(&mut report, page_index, err)?,
            }
        }

        if let Some(sheets) = sheets {
            let target = spec.target_page_size.as_ref().ok_or_else(|| {
                QuireError::Internal("2-up export without a target size".to_string())
            })?;
            let canvas = SheetCanvas::landscape(target, spec.dpi);
            let pages = Arc::new(processed);

            for sheet in sheets.iter().cloned() {
                if cancel.is_cancelled() {
                    warn!(sheet = sheet.index, "Export cancelled");
                    return Err(QuireError::Cancelled);
                }
                let pages = Arc::clone(&pages);
                let encoder = Arc::clone(&self.encoder);
                let (format, quality, align) =
                    (spec.image_format, spec.quality, spec.vertical_align);
                let sides = tokio::task::spawn_blocking(move || {
                    compose_sheet(&sheet, &pages, canvas, align)
                        .iter()
                        .map(|side| encoder.encode(side, format, quality))
                        .collect::<Result<Vec<_>>>()
                })
                .await
                .map_err(|err| QuireError::Internal(format!("sheet task failed: {err}")))??;
                report.images.extend(sides);
            }
            report.sheet_count = sheets.len();
        }

        info!(
            images = report.images.len(),
            failures = report.failures.len(),
            "Export finished"
        );
        Ok(report)
    }

    /// Assemble the report's images into the final PDF.
    pub fn assemble(&self, report: &ExportReport) -> Result<Vec<u8>> {
        self.writer.assemble(&report.images, report.page_size_pt)
    }

    // -- Helpers --------------------------------------------------------------

    /// Validate the whole export up front and build one task per page.
    fn page_tasks(
        &self,
        info: &DocumentInfo,
        page_filters: &HashMap<usize, FilterSettings>,
        spec: &ExportSpec,
    ) -> Result<Vec<PageTask>> {
        spec.validate()?;
        if info.page_count == 0 {
            return Err(QuireError::validation(format!(
                "document {} has no pages",
                info.id
            )));
        }
        if spec.start_page > info.page_count {
            return Err(QuireError::validation(format!(
                "start_page {} is past the last page ({})",
                spec.start_page, info.page_count
            )));
        }
        for (&page_index, settings) in page_filters {
            if page_index >= info.page_count {
                return Err(QuireError::validation(format!(
                    "filters given for page index {page_index}, document has {} pages",
                    info.page_count
                )));
            }
            settings.validate()?;
        }

        (spec.start_page - 1..info.page_count)
            .map(|page_index| {
                let dimensions = info.page(page_index)?;
                let dpi = self.dpi_policy.export_dpi(
                    spec.dpi,
                    spec.target_page_size.as_ref(),
                    spec.pad_to_exact_size,
                    dimensions,
                )?;
                let pad = match (&spec.target_page_size, spec.pad_to_exact_size) {
                    (Some(target), true) => {
                        let (width, height) = target.pixels_at(dpi);
                        Some(PadOverlay {
                            width,
                            height,
                            side: HorizontalSide::for_page(page_index + 1, spec.first_odd_page),
                        })
                    }
                    _ => None,
                };
                Ok(PageTask {
                    document_id: info.id.clone(),
                    page_index,
                    dpi,
                    filters: page_filters
                        .get(&page_index)
                        .filter(|settings| !settings.is_default())
                        .copied(),
                    number: None,
                    pad,
                })
            })
            .collect()
    }

    /// Record a per-page failure, or pass anything more serious through.
    fn record_failure(
        &self,
        report: &mut ExportReport,
        page_index: usize,
        err: QuireError,
    ) -> Result<()> {
        if err.class() != ErrorClass::PerPage {
            return Err(err);
        }
        warn!(page_index, %err, "Page failed during export");
        report.failures.push(PageFailure {
            page_index,
            error: err,
        });
        Ok(())
    }

    async fn page_number_stamp(&self) -> Option<Arc<PageNumberStamp>> {
        if let Some(loaded) = self.stamp.get() {
            return loaded.clone();
        }
        let font_path = self.font_path.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            PageNumberStamp::load(font_path.as_deref()).map(Arc::new)
        })
        .await
        .unwrap_or_else(|err| {
            warn!(%err, "Font loading task failed");
            None
        });
        if loaded.is_none() {
            warn!("No font available; page numbers will be skipped");
        }
        self.stamp.get_or_init(|| loaded).clone()
    }
}

fn validate_quality(quality: u8) -> Result<()> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(QuireError::validation(format!(
            "quality {quality} outside [1, 100]"
        )))
    }
}

/// Physical output page size: the target, turned landscape for 2-up.
fn output_page_size(spec: &ExportSpec) -> Option<(f64, f64)> {
    let (width, height) = spec.target_page_size.as_ref()?.dimensions_pt();
    Some(if spec.two_up {
        (height, width)
    } else {
        (width, height)
    })
}
