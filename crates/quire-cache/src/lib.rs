// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-cache: in-process page cache for rendered and filtered page images.
//
// Two independently budgeted tiers share one interface: the rendered tier
// holds raw rasterizer output (reused across many filter experiments) and the
// filtered tier holds pages after the filter pipeline. Both evict whole
// entries in least-recently-used order. Nothing is persisted; the cache lives
// as long as its owner.

pub mod key;
pub mod store;
pub mod tiered;

pub use key::{CacheTier, ContentHash, FingerprintKey};
pub use store::{CacheStats, CacheStore, PutOutcome};
pub use tiered::{PageCache, PageCacheStats};
