// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-document: page-level processing for Quire.
//
// Provides PDF inspection and assembly, image encoding, the tonal/colour
// filter pipeline with auto-enhance, page-number and padding overlays, and
// 2-up sheet imposition (sequential and cut-and-stack). Rasterization sits
// behind the `Rasterizer` trait; a MuPDF implementation is available with the
// `mupdf` feature.

pub mod filter;
pub mod image;
pub mod impose;
pub mod pdf;
pub mod traits;

#[cfg(feature = "mupdf")]
pub mod raster;

// Re-export the primary types so callers can use `quire_document::PdfReader` etc.
pub use filter::{FilterPipeline, auto_enhance_settings};
pub use self::image::padding::{HorizontalSide, pad_to_size};
pub use self::image::page_number::{PageNumberStamp, format_label};
pub use self::image::processor::{ImageProcessor, StandardEncoder};
pub use impose::compose::{SheetCanvas, compose};
pub use impose::plan::{Sheet, Slot, plan};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use traits::{ContainerWriter, EncodedImage, ImageEncoder, Rasterizer};

#[cfg(feature = "mupdf")]
pub use raster::MupdfRasterizer;
