// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache fingerprints.

use std::fmt;

use quire_core::FilterSettings;

/// Which tier a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    Rendered,
    Filtered,
}

/// Content component of a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentHash {
    /// Raw rasterizer output.
    Raw,
    /// Output of the filter pipeline for settings with this fingerprint.
    Filtered(String),
}

/// Identifies one cacheable page image.
///
/// Equality and hashing cover every field, DPI included as an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerprintKey {
    pub document_id: String,
    pub page_index: usize,
    pub dpi: u32,
    pub content: ContentHash,
}

impl FingerprintKey {
    /// Key for the raw render of a page.
    pub fn rendered(document_id: impl Into<String>, page_index: usize, dpi: u32) -> Self {
        Self {
            document_id: document_id.into(),
            page_index,
            dpi,
            content: ContentHash::Raw,
        }
    }

    /// Key for a page after applying `settings`.
    pub fn filtered(
        document_id: impl Into<String>,
        page_index: usize,
        dpi: u32,
        settings: &FilterSettings,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            page_index,
            dpi,
            content: ContentHash::Filtered(settings.fingerprint()),
        }
    }

    pub fn tier(&self) -> CacheTier {
        match self.content {
            ContentHash::Raw => CacheTier::Rendered,
            ContentHash::Filtered(_) => CacheTier::Filtered,
        }
    }
}

/// `{document_id}_{page_index}_{dpi}_{filter_hash|none}`
impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = match &self.content {
            ContentHash::Raw => "none",
            ContentHash::Filtered(hash) => hash.as_str(),
        };
        write!(
            f,
            "{}_{}_{}_{}",
            self.document_id, self.page_index, self.dpi, content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_key_formats_with_none() {
        let key = FingerprintKey::rendered("3fa2c1", 4, 150);
        assert_eq!(key.to_string(), "3fa2c1_4_150_none");
        assert_eq!(key.tier(), CacheTier::Rendered);
    }

    #[test]
    fn filtered_key_embeds_settings_hash() {
        let settings = FilterSettings {
            brightness: 10.0,
            ..FilterSettings::default()
        };
        let key = FingerprintKey::filtered("doc", 0, 300, &settings);
        assert_eq!(
            key.to_string(),
            format!("doc_0_300_{}", settings.fingerprint())
        );
        assert_eq!(key.tier(), CacheTier::Filtered);
    }

    #[test]
    fn keys_with_equal_settings_are_equal() {
        let a = FilterSettings {
            contrast: 25.0,
            gamma: 1.4,
            ..FilterSettings::default()
        };
        let b = FilterSettings {
            gamma: 1.4,
            contrast: 25.0,
            ..FilterSettings::default()
        };
        assert_eq!(
            FingerprintKey::filtered("d", 1, 72, &a),
            FingerprintKey::filtered("d", 1, 72, &b)
        );
    }

    #[test]
    fn dpi_participates_in_equality() {
        assert_ne!(
            FingerprintKey::rendered("d", 1, 72),
            FingerprintKey::rendered("d", 1, 73)
        );
    }
}
