// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page geometry in, assembled image PDFs out.

pub mod reader;
pub mod writer;

pub use reader::{PdfReader, document_id};
pub use writer::PdfWriter;
