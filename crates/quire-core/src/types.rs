// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Quire.

use serde::{Deserialize, Serialize};

use crate::dpi::{MAX_DPI, MIN_DPI};
use crate::error::{QuireError, Result};

/// Points per inch, the PDF user-space unit.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Largest paper area, in pixels at [`MAX_DPI`], an export may target.
/// Leaves room for Tabloid and A3 with margin to spare.
pub const MAX_PAPER_PIXELS: f64 = (1u64 << 28) as f64;

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_in: f64, height_in: f64 },
}

impl PaperSize {
    /// Portrait dimensions in inches (width, height).
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.69),
            Self::A3 => (11.69, 16.54),
            Self::A5 => (5.83, 8.27),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Custom {
                width_in,
                height_in,
            } => (*width_in, *height_in),
        }
    }

    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f64, f64) {
        let (w, h) = self.dimensions_in();
        (w * POINTS_PER_INCH, h * POINTS_PER_INCH)
    }

    /// Pixel dimensions (width, height) when rasterised at `dpi`.
    pub fn pixels_at(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.dimensions_in();
        (inches_to_px(w, dpi), inches_to_px(h, dpi))
    }

    /// Parse a paper name as typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" | "ledger" => Some(Self::Tabloid),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        let (w, h) = self.dimensions_in();
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(QuireError::validation(format!(
                "paper size must be positive, got {w}x{h} in"
            )));
        }
        let max_dpi = MAX_DPI as f64;
        if (w * max_dpi) * (h * max_dpi) > MAX_PAPER_PIXELS {
            return Err(QuireError::validation(format!(
                "paper size {w}x{h} in is too large to render"
            )));
        }
        Ok(())
    }
}

/// Convert a length in inches to whole pixels at `dpi`.
pub fn inches_to_px(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).round().max(1.0) as u32
}

/// Encodings available for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Parse a format name (`jpeg`, `jpg`, `png`, `webp`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// How pages are placed on 2-up sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Pages in natural order, two per sheet, front side only.
    #[default]
    Sequential,
    /// Double-sided sheets that are cut down the middle and stacked.
    CutAndStack,
}

/// Vertical placement of a page within its half of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
}

/// Size of one PDF page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageDimensions {
    pub fn width_in(&self) -> f64 {
        self.width_pt / POINTS_PER_INCH
    }

    pub fn height_in(&self) -> f64 {
        self.height_pt / POINTS_PER_INCH
    }
}

/// An uploaded document. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Stable identifier derived from the file contents.
    pub id: String,
    pub page_count: usize,
    /// Per-page dimensions, indexed by 0-based page index.
    pub pages: Vec<PageDimensions>,
}

impl DocumentInfo {
    /// Dimensions of `page_index`, or a validation error when out of range.
    pub fn page(&self, page_index: usize) -> Result<&PageDimensions> {
        self.pages.get(page_index).ok_or_else(|| {
            QuireError::validation(format!(
                "page index {} out of range (document {} has {} pages)",
                page_index, self.id, self.page_count
            ))
        })
    }
}

/// Page-number overlay options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNumbering {
    /// Label template: `{n}` is the page number, `{total}` the page count.
    pub format: String,
    /// Font size in points (8-24).
    pub size_pt: u32,
    /// Distance from the bottom-right corner in points at 150 DPI (10-100).
    pub margin: u32,
}

impl Default for PageNumbering {
    fn default() -> Self {
        Self {
            format: "Page {n}".to_string(),
            size_pt: 11,
            margin: 30,
        }
    }
}

/// Everything an export call needs. Built once, never mutated during
/// processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
    /// Base export resolution.
    pub dpi: u32,
    pub image_format: ImageFormat,
    /// Encoder quality (1-100). Ignored by lossless formats.
    pub quality: u8,
    /// Physical page size of the output. Required for 2-up.
    pub target_page_size: Option<PaperSize>,
    /// Pad every page with white to exactly the target size.
    pub pad_to_exact_size: bool,
    /// Page number treated as the first recto when alternating padding.
    pub first_odd_page: usize,
    pub two_up: bool,
    pub layout_mode: LayoutMode,
    pub vertical_align: VerticalAlign,
    /// First document page (1-based) included in the export.
    pub start_page: usize,
    pub page_numbers: Option<PageNumbering>,
}

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            dpi: 300,
            image_format: ImageFormat::Jpeg,
            quality: 95,
            target_page_size: None,
            pad_to_exact_size: false,
            first_odd_page: 1,
            two_up: false,
            layout_mode: LayoutMode::Sequential,
            vertical_align: VerticalAlign::Top,
            start_page: 1,
            page_numbers: None,
        }
    }
}

impl ExportSpec {
    /// Check every field that can be checked without the document.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(QuireError::validation(format!(
                "export DPI {} outside [{MIN_DPI}, {MAX_DPI}]",
                self.dpi
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(QuireError::validation(format!(
                "quality {} outside [1, 100]",
                self.quality
            )));
        }
        if self.start_page < 1 {
            return Err(QuireError::validation("start_page is 1-based"));
        }
        if self.first_odd_page < 1 {
            return Err(QuireError::validation("first_odd_page is 1-based"));
        }
        if let Some(size) = &self.target_page_size {
            size.validate()?;
        }
        if self.two_up && self.target_page_size.is_none() {
            return Err(QuireError::validation(
                "2-up layout requires target_page_size",
            ));
        }
        if self.pad_to_exact_size && self.target_page_size.is_none() {
            return Err(QuireError::validation(
                "pad_to_exact_size requires target_page_size",
            ));
        }
        if let Some(numbering) = &self.page_numbers {
            if !(8..=24).contains(&numbering.size_pt) {
                return Err(QuireError::validation(format!(
                    "page number size {} outside [8, 24]",
                    numbering.size_pt
                )));
            }
            if !(10..=100).contains(&numbering.margin) {
                return Err(QuireError::validation(format!(
                    "page number margin {} outside [10, 100]",
                    numbering.margin
                )));
            }
            if numbering.format.trim().is_empty() {
                return Err(QuireError::validation("page number format is empty"));
            }
        }
        Ok(())
    }
}
