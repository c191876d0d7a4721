// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dpi::DpiPolicy;
use crate::error::Result;

const MEGABYTE: usize = 1024 * 1024;

/// Settings for one Quire process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    /// Byte budget of the raw-render cache tier.
    pub rendered_cache_budget_bytes: usize,
    /// Byte budget of the filtered-image cache tier.
    pub filtered_cache_budget_bytes: usize,
    /// On-screen height previews are rendered for.
    pub preview_height_px: u32,
    /// Upper clamp for preview DPI.
    pub preview_max_dpi: u32,
    /// Export DPI when the caller does not supply one.
    pub default_export_dpi: u32,
    /// Paper size used when the caller asks for a target size by default.
    pub default_paper_size: crate::PaperSize,
    /// TTF/OTF used for page numbers. Falls back to the system sans-serif.
    pub page_number_font: Option<PathBuf>,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            rendered_cache_budget_bytes: 100 * MEGABYTE,
            filtered_cache_budget_bytes: 100 * MEGABYTE,
            preview_height_px: 700,
            preview_max_dpi: 100,
            default_export_dpi: 300,
            default_paper_size: crate::PaperSize::Letter,
            page_number_font: None,
        }
    }
}

impl QuireConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// The DPI policy these settings describe.
    pub fn dpi_policy(&self) -> DpiPolicy {
        DpiPolicy {
            preview_height_px: self.preview_height_px,
            preview_max_dpi: self.preview_max_dpi,
        }
    }
}
