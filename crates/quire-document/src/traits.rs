// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits at the edges of the page pipeline.
//
// The orchestrator depends only on these traits, so the PDF engine, the
// encoder, and the container writer can be swapped (and faked in tests).

use image::RgbaImage;
use quire_core::ImageFormat;
use quire_core::error::Result;

/// Turns one page of a registered document into pixels.
pub trait Rasterizer: Send + Sync {
    /// Render `page_index` (0-based) of `document_id` at `dpi`.
    ///
    /// Fails with `QuireError::Render` when the page index is out of range or
    /// the document is unknown or corrupt.
    fn render(&self, document_id: &str, page_index: usize, dpi: u32) -> Result<RgbaImage>;
}

/// Encodes a pixel buffer into a compressed image format.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<EncodedImage>;
}

/// Builds the final paginated document from encoded images.
pub trait ContainerWriter: Send + Sync {
    /// Assemble `images` in order. `page_size_pt` is the physical size every
    /// page should take, or `None` to derive each page from its image.
    fn assemble(&self, images: &[EncodedImage], page_size_pt: Option<(f64, f64)>)
    -> Result<Vec<u8>>;
}

/// One encoded output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}
