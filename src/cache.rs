//! Resolved-value cache
//!
//! Maps frame keys to the frame id pairs already resolved for them. The cache is
//! the only state shared between the requesting side and the owning side: the
//! dispatcher inserts completed resolutions, the owning thread seeds and removes
//! entries as frames come and go. Both go through [`FrameIdCache::insert`] and
//! [`FrameIdCache::remove`], which take the write lock.

use crate::types::{FrameIdPair, FrameKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free counters for cache traffic.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    removals: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub removals: u64,
}

impl CacheStatsSnapshot {
    /// Hit rate in `0.0..=1.0`; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }
}

/// Shared frame id cache. Cloning yields another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct FrameIdCache {
    entries: Arc<RwLock<HashMap<FrameKey, FrameIdPair>>>,
    stats: Arc<CacheStats>,
}

impl FrameIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, counting the hit or miss.
    pub fn lookup(&self, key: FrameKey) -> Option<FrameIdPair> {
        let found = self.entries.read().get(&key).copied();
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Look up a key without touching the counters.
    pub fn peek(&self, key: FrameKey) -> Option<FrameIdPair> {
        self.entries.read().get(&key).copied()
    }

    /// Insert or overwrite the value for `key`, returning the previous value.
    pub fn insert(&self, key: FrameKey, value: FrameIdPair) -> Option<FrameIdPair> {
        let previous = self.entries.write().insert(key, value);
        self.stats.record_insert();
        previous
    }

    /// Remove the entry for `key`. No-op when absent.
    pub fn remove(&self, key: FrameKey) -> Option<FrameIdPair> {
        let removed = self.entries.write().remove(&key);
        if removed.is_some() {
            self.stats.record_removal();
        }
        removed
    }

    pub fn contains(&self, key: FrameKey) -> bool {
        self.entries.read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
