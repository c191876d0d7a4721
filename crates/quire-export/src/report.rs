// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export results: encoded images plus the pages that failed along the way.

use quire_core::QuireError;
use quire_document::EncodedImage;

/// A page that could not be processed. The rest of the export went ahead.
#[derive(Debug)]
pub struct PageFailure {
    /// 0-based document page index.
    pub page_index: usize,
    pub error: QuireError,
}

/// Output of one export call, ready for container assembly.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Encoded pages (or sheet sides for 2-up), in output order.
    pub images: Vec<EncodedImage>,
    pub failures: Vec<PageFailure>,
    /// Physical size every output page should take, in points. Landscape for
    /// 2-up. `None` lets each page follow its image.
    pub page_size_pt: Option<(f64, f64)>,
    /// Number of physical sheets when the export was 2-up, else zero.
    pub sheet_count: usize,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0-based indices of the failed pages.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.page_index).collect()
    }
}
