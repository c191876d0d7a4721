// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: encode/decode, padding, and page-number overlays.

pub mod padding;
pub mod page_number;
pub mod processor;

pub use processor::ImageProcessor;
