// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-budgeted LRU store.
//
// All state sits behind one `parking_lot::Mutex`, so recency updates,
// inserts, and evictions are atomic with respect to concurrent callers and
// the running byte total always equals the sum of resident entry sizes.

use lru::LruCache;
use parking_lot::Mutex;
use quire_core::error::{QuireError, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::key::FingerprintKey;

/// A cached payload. Owned by the store; callers receive copies.
#[derive(Debug)]
struct CacheEntry {
    payload: Vec<u8>,
    size: usize,
    /// Store-wide sequence number of the last get or put.
    last_access: u64,
}

/// Counters reported by [`CacheStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_bytes: usize,
    pub budget_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Result of a successful [`CacheStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Stored within budget after evicting `evicted` entries.
    Stored { evicted: usize },
    /// Larger than the whole budget. Every other entry was evicted and this
    /// one is resident on its own, above budget, until the next insert.
    Oversized { evicted: usize },
}

struct StoreInner {
    entries: LruCache<FingerprintKey, CacheEntry>,
    total_bytes: usize,
    budget_bytes: usize,
    sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl StoreInner {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Least-recently-used cache bounded by total payload bytes.
pub struct CacheStore {
    name: &'static str,
    inner: Mutex<StoreInner>,
}

impl CacheStore {
    /// Create an empty store. `name` only labels log lines.
    pub fn new(name: &'static str, budget_bytes: usize) -> Self {
        Self {
            name,
            inner: Mutex::new(StoreInner {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                budget_bytes,
                sequence: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    ///
    /// A miss is a normal outcome, not an error.
    pub fn get(&self, key: &FingerprintKey) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence();
        let payload = inner.entries.get_mut(key).map(|entry| {
            entry.last_access = sequence;
            entry.payload.clone()
        });
        match payload {
            Some(payload) => {
                inner.hits += 1;
                debug!(tier = self.name, %key, "cache hit");
                Some(payload)
            }
            None => {
                inner.misses += 1;
                debug!(tier = self.name, %key, "cache miss");
                None
            }
        }
    }

    /// Insert or replace `key`, then evict least-recently-used entries until
    /// the total fits the budget.
    ///
    /// Replacing an existing key discounts the old payload first and resets
    /// its recency. An empty payload is rejected and nothing is counted.
    pub fn put(&self, key: FingerprintKey, payload: Vec<u8>) -> Result<PutOutcome> {
        if payload.is_empty() {
            return Err(QuireError::Cache(format!("refusing empty payload for {key}")));
        }
        let size = payload.len();

        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence();

        if let Some(previous) = inner.entries.pop(&key) {
            inner.total_bytes -= previous.size;
        }

        let mut evicted = 0;
        while inner.total_bytes + size > inner.budget_bytes {
            match inner.entries.pop_lru() {
                Some((old_key, old)) => {
                    inner.total_bytes -= old.size;
                    inner.evictions += 1;
                    evicted += 1;
                    debug!(tier = self.name, key = %old_key, bytes = old.size, "evicted");
                }
                None => break,
            }
        }

        let oversized = size > inner.budget_bytes;
        if oversized {
            warn!(
                tier = self.name,
                %key,
                bytes = size,
                budget = inner.budget_bytes,
                "entry exceeds cache budget; admitted alone"
            );
        }

        inner.entries.put(
            key,
            CacheEntry {
                payload,
                size,
                last_access: sequence,
            },
        );
        inner.total_bytes += size;

        Ok(if oversized {
            PutOutcome::Oversized { evicted }
        } else {
            PutOutcome::Stored { evicted }
        })
    }

    /// Drop every entry belonging to `document_id`. Returns how many were
    /// removed.
    pub fn clear(&self, document_id: &str) -> usize {
        let mut inner = self.inner.lock();
        let doomed: Vec<FingerprintKey> = inner
            .entries
            .iter()
            .filter(|(key, _)| key.document_id == document_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            if let Some(entry) = inner.entries.pop(key) {
                inner.total_bytes -= entry.size;
            }
        }
        debug!(tier = self.name, document_id, removed = doomed.len(), "cleared document");
        doomed.len()
    }

    /// Drop everything and reset the counters.
    pub fn clear_all(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_bytes = 0;
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entry_count: inner.entries.len(),
            total_bytes: inner.total_bytes,
            budget_bytes: inner.budget_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    /// Membership test that leaves recency and counters untouched.
    pub fn contains(&self, key: &FingerprintKey) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Sequence number of the last access to `key`, without touching it.
    pub fn last_access(&self, key: &FingerprintKey) -> Option<u64> {
        self.inner.lock().entries.peek(key).map(|entry| entry.last_access)
    }

    /// Sum of resident entry sizes, recomputed from scratch.
    #[cfg(test)]
    fn resident_bytes(&self) -> usize {
        self.inner.lock().entries.iter().map(|(_, e)| e.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn key(page: usize) -> FingerprintKey {
        FingerprintKey::rendered("doc", page, 150)
    }

    fn bytes(len: usize, fill: u8) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn get_after_put_returns_identical_bytes() {
        let store = CacheStore::new("test", 1024);
        let payload: Vec<u8> = (0..=255).collect();
        store.put(key(0), payload.clone()).unwrap();
        assert_eq!(store.get(&key(0)), Some(payload));
    }

    #[test]
    fn miss_is_not_an_error() {
        let store = CacheStore::new("test", 1024);
        assert_eq!(store.get(&key(7)), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn empty_payload_is_rejected_without_accounting() {
        let store = CacheStore::new("test", 1024);
        assert!(matches!(store.put(key(0), Vec::new()), Err(QuireError::Cache(_))));
        let stats = store.stats();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let store = CacheStore::new("test", 300);
        store.put(key(0), bytes(100, 0)).unwrap();
        store.put(key(1), bytes(100, 1)).unwrap();
        store.put(key(2), bytes(100, 2)).unwrap();

        // Touch page 0 so page 1 becomes the oldest.
        assert!(store.get(&key(0)).is_some());

        let outcome = store.put(key(3), bytes(100, 3)).unwrap();
        assert_eq!(outcome, PutOutcome::Stored { evicted: 1 });
        assert!(store.contains(&key(0)));
        assert!(!store.contains(&key(1)));
        assert!(store.contains(&key(2)));
        assert!(store.contains(&key(3)));
        assert_eq!(store.stats().total_bytes, 300);
    }

    #[test]
    fn replacing_a_key_discounts_the_old_size() {
        let store = CacheStore::new("test", 1000);
        store.put(key(0), bytes(400, 0)).unwrap();
        store.put(key(1), bytes(100, 1)).unwrap();
        store.put(key(0), bytes(50, 9)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.total_bytes, 150);
        assert_eq!(store.get(&key(0)), Some(bytes(50, 9)));
    }

    #[test]
    fn replacing_a_key_resets_recency() {
        let store = CacheStore::new("test", 200);
        store.put(key(0), bytes(100, 0)).unwrap();
        store.put(key(1), bytes(100, 1)).unwrap();
        store.put(key(0), bytes(100, 2)).unwrap();
        store.put(key(2), bytes(100, 3)).unwrap();

        assert!(store.contains(&key(0)));
        assert!(!store.contains(&key(1)));
    }

    #[test]
    fn oversized_entry_is_admitted_alone() {
        let store = CacheStore::new("test", 100);
        store.put(key(0), bytes(40, 0)).unwrap();
        store.put(key(1), bytes(40, 1)).unwrap();

        let outcome = store.put(key(2), bytes(250, 2)).unwrap();
        assert_eq!(outcome, PutOutcome::Oversized { evicted: 2 });

        let stats = store.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, 250);
        assert!(stats.total_bytes > stats.budget_bytes);
        assert_eq!(store.get(&key(2)), Some(bytes(250, 2)));

        // The next insert pushes it out and the budget holds again.
        store.put(key(3), bytes(10, 3)).unwrap();
        let stats = store.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, 10);
    }

    #[test]
    fn total_tracks_resident_sizes_across_mixed_operations() {
        let store = CacheStore::new("test", 2_000);
        // Deterministic pseudo-random workload (LCG).
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) as usize
        };
        for _ in 0..2_000 {
            let page = next() % 40;
            match next() % 4 {
                0 | 1 => {
                    let len = 1 + next() % 400;
                    store.put(key(page), bytes(len, page as u8)).unwrap();
                }
                2 => {
                    store.get(&key(page));
                }
                _ => {
                    if next() % 20 == 0 {
                        store.clear("doc");
                    }
                }
            }
            let stats = store.stats();
            assert_eq!(stats.total_bytes, store.resident_bytes());
            assert!(stats.total_bytes <= stats.budget_bytes);
        }
    }

    #[test]
    fn clear_only_touches_one_document() {
        let store = CacheStore::new("test", 1_000);
        store.put(FingerprintKey::rendered("a", 0, 72), bytes(10, 0)).unwrap();
        store.put(FingerprintKey::rendered("a", 1, 72), bytes(10, 0)).unwrap();
        store.put(FingerprintKey::rendered("b", 0, 72), bytes(30, 0)).unwrap();

        assert_eq!(store.clear("a"), 2);
        let stats = store.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, 30);
    }

    #[test]
    fn access_sequence_advances_on_get_and_put() {
        let store = CacheStore::new("test", 1_000);
        store.put(key(0), bytes(10, 0)).unwrap();
        let after_put = store.last_access(&key(0)).unwrap();
        store.get(&key(0));
        assert!(store.last_access(&key(0)).unwrap() > after_put);
    }

    #[test]
    fn concurrent_puts_on_one_key_keep_accounting_consistent() {
        let store = Arc::new(CacheStore::new("test", 10_000));
        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for round in 0..200 {
                        let len = 1 + (thread * 31 + round * 7) % 500;
                        store.put(key(0), bytes(len, thread as u8)).unwrap();
                        if let Some(payload) = store.get(&key(0)) {
                            // Never a torn payload: all bytes come from one put.
                            assert!(payload.iter().all(|b| *b == payload[0]));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = store.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, store.resident_bytes());
    }
}
