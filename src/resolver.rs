//! Owning-thread resolvers
//!
//! A resolver turns a frame key into its frame id pair. It only ever runs on the
//! owning thread and must be total: a frame that cannot be found resolves to
//! [`FrameIdPair::INVALID`].

use crate::types::{FrameIdPair, FrameKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

pub trait FrameIdResolver: Send + Sync {
    fn resolve(&self, key: FrameKey) -> FrameIdPair;
}

impl<F> FrameIdResolver for F
where
    F: Fn(FrameKey) -> FrameIdPair + Send + Sync,
{
    fn resolve(&self, key: FrameKey) -> FrameIdPair {
        self(key)
    }
}

/// Table of live frames kept by the owning side.
///
/// Frames are registered when created and unregistered when destroyed; lookups
/// for anything else resolve to [`FrameIdPair::INVALID`].
#[derive(Debug, Default)]
pub struct FrameRegistry {
    frames: RwLock<HashMap<FrameKey, FrameIdPair>>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live frame. Returns the pair it replaced, if any.
    pub fn register(&self, key: FrameKey, ids: FrameIdPair) -> Option<FrameIdPair> {
        debug!(frame = %key, frame_id = ids.frame_id, parent_frame_id = ids.parent_frame_id, "Frame registered");
        self.frames.write().insert(key, ids)
    }

    pub fn unregister(&self, key: FrameKey) -> Option<FrameIdPair> {
        let removed = self.frames.write().remove(&key);
        if removed.is_some() {
            debug!(frame = %key, "Frame unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }
}

impl FrameIdResolver for FrameRegistry {
    fn resolve(&self, key: FrameKey) -> FrameIdPair {
        self.frames
            .read()
            .get(&key)
            .copied()
            .unwrap_or(FrameIdPair::INVALID)
    }
}
