// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-tier page cache: raw renders and filtered images, budgeted separately.

use quire_core::QuireConfig;
use quire_core::error::Result;
use serde::Serialize;
use tracing::info;

use crate::key::{CacheTier, FingerprintKey};
use crate::store::{CacheStats, CacheStore, PutOutcome};

/// Per-tier statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCacheStats {
    pub rendered: CacheStats,
    pub filtered: CacheStats,
}

/// Routes each key to the store for its tier.
pub struct PageCache {
    rendered: CacheStore,
    filtered: CacheStore,
}

impl PageCache {
    pub fn new(rendered_budget_bytes: usize, filtered_budget_bytes: usize) -> Self {
        info!(
            rendered_budget_bytes,
            filtered_budget_bytes, "page cache initialised"
        );
        Self {
            rendered: CacheStore::new("rendered", rendered_budget_bytes),
            filtered: CacheStore::new("filtered", filtered_budget_bytes),
        }
    }

    pub fn from_config(config: &QuireConfig) -> Self {
        Self::new(
            config.rendered_cache_budget_bytes,
            config.filtered_cache_budget_bytes,
        )
    }

    fn store(&self, tier: CacheTier) -> &CacheStore {
        match tier {
            CacheTier::Rendered => &self.rendered,
            CacheTier::Filtered => &self.filtered,
        }
    }

    pub fn get(&self, key: &FingerprintKey) -> Option<Vec<u8>> {
        self.store(key.tier()).get(key)
    }

    pub fn put(&self, key: FingerprintKey, payload: Vec<u8>) -> Result<PutOutcome> {
        self.store(key.tier()).put(key, payload)
    }

    pub fn contains(&self, key: &FingerprintKey) -> bool {
        self.store(key.tier()).contains(key)
    }

    /// Drop every entry of `document_id` from both tiers.
    pub fn clear(&self, document_id: &str) -> usize {
        self.rendered.clear(document_id) + self.filtered.clear(document_id)
    }

    pub fn clear_all(&self) {
        self.rendered.clear_all();
        self.filtered.clear_all();
    }

    pub fn stats(&self) -> PageCacheStats {
        PageCacheStats {
            rendered: self.rendered.stats(),
            filtered: self.filtered.stats(),
        }
    }
}
