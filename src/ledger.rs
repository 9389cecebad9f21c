//! Pending-request ledger
//!
//! Per-key FIFO of callbacks waiting on a resolution. The first callback for a
//! key opens an entry and tells the dispatcher to start a resolution; later
//! callbacks for the same key join it. The ledger lives on the requesting thread
//! only, so callbacks need not be `Send`.

use crate::types::{FrameIdPair, FrameKey};
use std::collections::HashMap;
use std::fmt;

/// One-shot receiver of a resolved frame id pair.
pub type FrameIdCallback = Box<dyn FnOnce(FrameIdPair) + 'static>;

/// Identifies one posted resolution so its completion can find its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Result of [`PendingLedger::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// True when no resolution was in flight for the key and the caller must start one.
    pub newly_started: bool,
    /// Resolution the callback is waiting on.
    pub request_id: RequestId,
}

struct PendingEntry {
    request_id: RequestId,
    callbacks: Vec<FrameIdCallback>,
}

#[derive(Default)]
pub struct PendingLedger {
    entries: HashMap<FrameKey, PendingEntry>,
    next_request_id: u64,
}

impl fmt::Debug for PendingLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLedger")
            .field("keys", &self.entries.len())
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the queue for `key`, opening an entry if none exists.
    pub fn enqueue(&mut self, key: FrameKey, callback: FrameIdCallback) -> EnqueueOutcome {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.callbacks.push(callback);
            return EnqueueOutcome {
                newly_started: false,
                request_id: entry.request_id,
            };
        }

        self.next_request_id += 1;
        let request_id = RequestId(self.next_request_id);
        self.entries.insert(
            key,
            PendingEntry {
                request_id,
                callbacks: vec![callback],
            },
        );
        EnqueueOutcome {
            newly_started: true,
            request_id,
        }
    }

    /// Remove and return every callback queued for `key`, in enqueue order.
    pub fn drain(&mut self, key: FrameKey) -> Vec<FrameIdCallback> {
        self.entries
            .remove(&key)
            .map(|entry| entry.callbacks)
            .unwrap_or_default()
    }

    /// Drain `key` only if its entry is waiting on `request_id`.
    ///
    /// Returns `None` when the entry is gone or belongs to a later request.
    pub fn drain_request(
        &mut self,
        key: FrameKey,
        request_id: RequestId,
    ) -> Option<Vec<FrameIdCallback>> {
        match self.entries.get(&key) {
            Some(entry) if entry.request_id == request_id => Some(self.drain(key)),
            _ => None,
        }
    }

    /// Drop the entry for `key` without running its callbacks.
    pub fn discard(&mut self, key: FrameKey) -> usize {
        self.entries
            .remove(&key)
            .map(|entry| entry.callbacks.len())
            .unwrap_or(0)
    }

    /// True while a resolution for `key` is outstanding.
    pub fn is_in_flight(&self, key: FrameKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn callback_count(&self) -> usize {
        self.entries.values().map(|entry| entry.callbacks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
