//! Owning-thread side of the frame id map.

use crate::cache::FrameIdCache;
use crate::resolver::FrameIdResolver;
use crate::types::{FrameIdPair, FrameKey};
use std::sync::Arc;
use tracing::debug;

/// Shares the map's cache and resolver with the owning thread.
///
/// The owning thread learns about frame creation and destruction first; it
/// pushes that knowledge into the cache through this handle.
#[derive(Clone)]
pub struct OwnerHandle {
    cache: FrameIdCache,
    resolver: Arc<dyn FrameIdResolver>,
}

impl OwnerHandle {
    pub(crate) fn new(cache: FrameIdCache, resolver: Arc<dyn FrameIdResolver>) -> Self {
        Self { cache, resolver }
    }

    /// Cache the ids of a frame whose identity is known up front.
    ///
    /// Sentinel keys are never cached.
    pub fn seed(&self, key: FrameKey, value: FrameIdPair) {
        if key.is_sentinel() {
            debug!(frame = %key, "Ignoring seed for sentinel frame key");
            return;
        }
        self.cache.insert(key, value);
        debug!(
            frame = %key,
            frame_id = value.frame_id,
            parent_frame_id = value.parent_frame_id,
            "Seeded frame id"
        );
    }

    /// Drop the cached ids of a destroyed frame.
    pub fn invalidate(&self, key: FrameKey) -> bool {
        let removed = self.cache.remove(key).is_some();
        if removed {
            debug!(frame = %key, "Removed frame id on owning thread");
        }
        removed
    }

    /// Look up `key` synchronously. Must run on the owning thread.
    ///
    /// Misses are resolved on the spot and cached.
    pub fn resolve_now(&self, key: FrameKey) -> FrameIdPair {
        if key.is_sentinel() {
            return FrameIdPair::INVALID;
        }
        if let Some(value) = self.cache.lookup(key) {
            return value;
        }
        let value = self.resolver.resolve(key);
        self.cache.insert(key, value);
        value
    }

    pub fn cache(&self) -> &FrameIdCache {
        &self.cache
    }
}
