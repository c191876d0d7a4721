// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-export: drives pages from the rasterizer through the cache, the
// filter pipeline, overlays, and imposition to encoded output images.

pub mod cancel;
pub mod orchestrator;
pub mod report;

mod worker;

pub use cancel::CancelToken;
pub use orchestrator::Orchestrator;
pub use report::{ExportReport, PageFailure};
