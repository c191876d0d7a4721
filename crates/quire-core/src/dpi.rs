// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DPI resolution for preview and export rendering.
//
// Previews target a fixed on-screen height and are clamped into range; export
// resolutions are validated and rejected when out of range, before any
// rendering work starts.

use tracing::debug;

use crate::error::{QuireError, Result};
use crate::types::{PageDimensions, PaperSize};

/// Lowest resolution the rasterizer is ever asked for.
pub const MIN_DPI: u32 = 30;
/// Highest resolution the rasterizer is ever asked for.
pub const MAX_DPI: u32 = 600;

/// Resolution policy for one orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpiPolicy {
    /// On-screen height previews are rendered for.
    pub preview_height_px: u32,
    /// Upper clamp for preview DPI.
    pub preview_max_dpi: u32,
}

impl Default for DpiPolicy {
    fn default() -> Self {
        Self {
            preview_height_px: 700,
            preview_max_dpi: 100,
        }
    }
}

impl DpiPolicy {
    /// Preview DPI for a page `page_height_in` inches tall.
    ///
    /// Never fails: the derived value is clamped to
    /// `[MIN_DPI, preview_max_dpi]`.
    pub fn preview_dpi(&self, page_height_in: f64) -> u32 {
        let cap = self.preview_max_dpi.clamp(MIN_DPI, MAX_DPI);
        if !(page_height_in.is_finite() && page_height_in > 0.0) {
            return cap;
        }
        let derived = (self.preview_height_px as f64 / page_height_in).floor();
        clamp_preview(derived, cap)
    }

    /// Export DPI for one page.
    ///
    /// Without a target size (or when padding to it) the base DPI is used
    /// as is. Otherwise the base DPI is scaled by the factor that fits the
    /// native page into the target while preserving aspect ratio.
    pub fn export_dpi(
        &self,
        base_dpi: u32,
        target: Option<&PaperSize>,
        pad_to_exact_size: bool,
        native: &PageDimensions,
    ) -> Result<u32> {
        let dpi = match target {
            Some(size) if !pad_to_exact_size => {
                let (target_w, target_h) = size.dimensions_in();
                let scale = (target_w / native.width_in()).min(target_h / native.height_in());
                let scaled = (base_dpi as f64 * scale).floor();
                debug!(base_dpi, scale, scaled, "scaled export DPI to target size");
                if !scaled.is_finite() || scaled < 0.0 {
                    return Err(QuireError::validation(format!(
                        "cannot derive export DPI from page {}x{} pt",
                        native.width_pt, native.height_pt
                    )));
                }
                scaled as u32
            }
            _ => base_dpi,
        };
        validate_dpi(dpi)?;
        Ok(dpi)
    }
}

/// Reject a DPI outside `[MIN_DPI, MAX_DPI]`.
pub fn validate_dpi(dpi: u32) -> Result<()> {
    if (MIN_DPI..=MAX_DPI).contains(&dpi) {
        Ok(())
    } else {
        Err(QuireError::validation(format!(
            "DPI {dpi} outside [{MIN_DPI}, {MAX_DPI}]"
        )))
    }
}

fn clamp_preview(derived: f64, cap: u32) -> u32 {
    if derived.is_nan() {
        return cap;
    }
    derived.clamp(MIN_DPI as f64, cap as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_page() -> PageDimensions {
        PageDimensions {
            width_pt: 612.0,
            height_pt: 792.0,
        }
    }

    #[test]
    fn preview_dpi_is_derived_from_display_height() {
        let policy = DpiPolicy::default();
        // 700 px / 11 in = 63.6
        assert_eq!(policy.preview_dpi(11.0), 63);
    }

    #[test]
    fn low_preview_dpi_is_raised_to_minimum() {
        let policy = DpiPolicy::default();
        // 700 / 35 = 20
        assert_eq!(policy.preview_dpi(35.0), 30);
    }

    #[test]
    fn high_preview_dpi_is_clamped_to_cap() {
        let policy = DpiPolicy::default();
        // 700 / (7/9) = 900
        assert_eq!(policy.preview_dpi(700.0 / 900.0), 100);
    }

    #[test]
    fn export_dpi_outside_range_is_rejected() {
        let policy = DpiPolicy::default();
        let err = policy.export_dpi(900, None, false, &letter_page()).unwrap_err();
        assert!(matches!(err, QuireError::Validation(_)));
        assert!(policy.export_dpi(20, None, false, &letter_page()).is_err());
    }

    #[test]
    fn export_dpi_scales_to_target_size() {
        let policy = DpiPolicy::default();
        // Letter page onto Legal: width ratio 1.0, height ratio 14/11 -> 1.0
        let dpi = policy
            .export_dpi(300, Some(&PaperSize::Legal), false, &letter_page())
            .unwrap();
        assert_eq!(dpi, 300);

        // Letter page onto A5: min(5.83/8.5, 8.27/11) = 0.6859 -> 205
        let dpi = policy
            .export_dpi(300, Some(&PaperSize::A5), false, &letter_page())
            .unwrap();
        assert_eq!(dpi, 205);
    }

    #[test]
    fn padding_keeps_base_dpi() {
        let policy = DpiPolicy::default();
        let dpi = policy
            .export_dpi(300, Some(&PaperSize::A5), true, &letter_page())
            .unwrap();
        assert_eq!(dpi, 300);
    }

    #[test]
    fn scaled_export_dpi_is_still_validated() {
        let policy = DpiPolicy::default();
        let huge_page = PageDimensions {
            width_pt: 72.0 * 100.0,
            height_pt: 72.0 * 100.0,
        };
        // 300 * 8.5/100 = 25 -> below minimum
        assert!(
            policy
                .export_dpi(300, Some(&PaperSize::Letter), false, &huge_page)
                .is_err()
        );
    }
}
