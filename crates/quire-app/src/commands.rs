// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Results go to stdout as JSON; logs go to
// stderr.

use std::collections::HashMap;
use std::path::Path;

use quire_core::FilterSettings;
use quire_core::error::Result;
use quire_document::{ImageProcessor, PdfReader, auto_enhance_settings};
use tracing::info;

use crate::cli::{ExportArgs, PlanArgs};

pub fn info(input: &Path) -> Result<()> {
    let info = PdfReader::open(input)?.document_info()?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

pub fn plan(args: &PlanArgs) -> Result<()> {
    let sheets = quire_document::plan(args.pages, args.mode.into(), args.start_page)?;
    println!("{}", serde_json::to_string_pretty(&sheets)?);
    Ok(())
}

pub fn auto_enhance(input: &Path) -> Result<()> {
    let data = std::fs::read(input)?;
    let image = ImageProcessor::from_bytes(&data)?;
    let settings = auto_enhance_settings(image.as_rgba());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Per-page filters from a JSON object keyed by 0-based page index.
fn load_filters(path: Option<&Path>) -> Result<HashMap<usize, FilterSettings>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let text = std::fs::read_to_string(path)?;
    let filters: HashMap<usize, FilterSettings> = serde_json::from_str(&text)?;
    info!(pages = filters.len(), path = %path.display(), "Loaded page filters");
    Ok(filters)
}

#[cfg(feature = "mupdf")]
pub async fn export(config: &quire_core::QuireConfig, args: &ExportArgs) -> Result<()> {
    use std::sync::Arc;

    use quire_document::{MupdfRasterizer, PdfWriter};
    use quire_export::{CancelToken, Orchestrator};
    use tracing::warn;

    let filters = load_filters(args.filters.as_deref())?;
    let spec = args.to_spec(config);

    let data = std::fs::read(&args.input)?;
    let info = PdfReader::from_bytes(&data)?.document_info()?;
    let rasterizer = Arc::new(MupdfRasterizer::new());
    rasterizer.register(info.id.clone(), data)?;

    let mut writer = PdfWriter::new();
    if let Some(stem) = args.input.file_stem() {
        writer.set_title(stem.to_string_lossy());
    }
    let orchestrator = Orchestrator::new(config, rasterizer).with_writer(Arc::new(writer));
    orchestrator.register(info.clone());

    // Ctrl-C stops the export before the next page.
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling export");
            on_interrupt.cancel();
        }
    });

    let report = orchestrator.export(&info.id, &filters, &spec, &cancel).await?;
    for failure in &report.failures {
        warn!(
            page = failure.page_index + 1,
            error = %failure.error,
            "Page left out of export"
        );
    }

    let pdf = orchestrator.assemble(&report)?;
    std::fs::write(&args.output, &pdf)?;
    info!(
        output = %args.output.display(),
        pages = report.images.len(),
        failed = report.failures.len(),
        bytes = pdf.len(),
        "Export written"
    );
    Ok(())
}

#[cfg(not(feature = "mupdf"))]
pub async fn export(config: &quire_core::QuireConfig, args: &ExportArgs) -> Result<()> {
    // Check the inputs anyway so mistakes surface before a rebuild.
    args.to_spec(config).validate()?;
    load_filters(args.filters.as_deref())?;
    Err(quire_core::QuireError::validation(
        "export needs a PDF rasterizer; rebuild with `--features mupdf`",
    ))
}
