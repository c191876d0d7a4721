// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter module: ordered tonal/colour pipeline and auto-enhance.

pub mod auto;
pub mod pipeline;
pub mod stages;

pub use auto::auto_enhance_settings;
pub use pipeline::FilterPipeline;
pub use stages::Stage;
