//! Cross-thread frame id map
//!
//! [`FrameIdMap`] lives on the requesting thread. It answers sentinel keys and
//! cached keys synchronously; everything else is queued in the pending ledger
//! and resolved by a task posted to the owning thread. The owning task sends its
//! result back through the map's completion channel, and the requesting thread
//! delivers it when it pumps the map ([`FrameIdMap::process_completions`] or
//! [`FrameIdMap::wait_for_completions`]).
//!
//! Delivery order:
//! - callbacks for one key run together, in the order they were registered;
//! - distinct keys complete in the order their resolutions were posted, given
//!   a FIFO owning queue.

mod owner_handle;

pub use owner_handle::OwnerHandle;

use crate::cache::{CacheStatsSnapshot, FrameIdCache};
use crate::config::DispatchConfig;
use crate::error::FrameMapError;
use crate::ledger::{PendingLedger, RequestId};
use crate::resolver::FrameIdResolver;
use crate::task::TaskPoster;
use crate::types::{FrameIdPair, FrameKey};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::future::poll_fn;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Result of one owning-thread resolution, posted back to the requesting thread.
///
/// `value` is `None` when the task ended without resolving (panic, or dropped
/// before it ran).
#[derive(Debug, Clone, Copy)]
struct Completion {
    key: FrameKey,
    request_id: RequestId,
    value: Option<FrameIdPair>,
}

/// Travels with a resolution task and always reports back exactly once.
struct CompletionGuard {
    key: FrameKey,
    request_id: RequestId,
    completions: Option<UnboundedSender<Completion>>,
}

impl CompletionGuard {
    fn complete(mut self, value: FrameIdPair) {
        self.send(Some(value));
    }

    fn send(&mut self, value: Option<FrameIdPair>) {
        let Some(completions) = self.completions.take() else {
            return;
        };
        let completion = Completion {
            key: self.key,
            request_id: self.request_id,
            value,
        };
        if completions.send(completion).is_err() {
            debug!(frame = %self.key, "Frame id map dropped, discarding completion");
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.send(None);
    }
}

pub struct FrameIdMap {
    cache: FrameIdCache,
    ledger: RefCell<PendingLedger>,
    resolver: Arc<dyn FrameIdResolver>,
    owner: Arc<dyn TaskPoster>,
    completion_tx: UnboundedSender<Completion>,
    completion_rx: RefCell<UnboundedReceiver<Completion>>,
    /// Resolutions posted to the owning thread and not yet handled here.
    outstanding: Cell<usize>,
    /// Requests whose post was refused; their lost completions are not counted.
    rejected: RefCell<HashSet<RequestId>>,
    config: DispatchConfig,
}

impl FrameIdMap {
    /// Create a map that resolves through `resolver` on the thread behind `owner`.
    pub fn new(resolver: Arc<dyn FrameIdResolver>, owner: Arc<dyn TaskPoster>) -> Self {
        Self::with_config(resolver, owner, DispatchConfig::default())
    }

    pub fn with_config(
        resolver: Arc<dyn FrameIdResolver>,
        owner: Arc<dyn TaskPoster>,
        config: DispatchConfig,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded_channel();
        Self {
            cache: FrameIdCache::new(),
            ledger: RefCell::new(PendingLedger::new()),
            resolver,
            owner,
            completion_tx,
            completion_rx: RefCell::new(completion_rx),
            outstanding: Cell::new(0),
            rejected: RefCell::new(HashSet::new()),
            config,
        }
    }

    /// Handle for the owning thread: seeding, removal and synchronous lookups.
    pub fn owner_handle(&self) -> OwnerHandle {
        OwnerHandle::new(self.cache.clone(), Arc::clone(&self.resolver))
    }

    /// Resolve `key` and hand the result to `callback`.
    ///
    /// Sentinel keys and cached keys run `callback` before returning. Otherwise
    /// the callback runs during a later pump of the completion queue. Fails only
    /// when the owning thread no longer accepts tasks; the callback is dropped
    /// in that case.
    pub fn resolve_async<F>(&self, key: FrameKey, callback: F) -> Result<(), FrameMapError>
    where
        F: FnOnce(FrameIdPair) + 'static,
    {
        if key.is_sentinel() {
            trace!(frame = %key, "Sentinel frame key, no lookup needed");
            callback(FrameIdPair::INVALID);
            return Ok(());
        }

        if let Some(value) = self.cache.lookup(key) {
            // Callbacks queued before a seed landed go first.
            let queued = self.ledger.borrow_mut().drain(key);
            if queued.is_empty() {
                trace!(frame = %key, "Frame id served from cache");
            } else {
                debug!(
                    frame = %key,
                    queued = queued.len(),
                    "Cached frame id released queued callbacks"
                );
                for queued_callback in queued {
                    queued_callback(value);
                }
            }
            callback(value);
            return Ok(());
        }

        let outcome = self.ledger.borrow_mut().enqueue(key, Box::new(callback));
        if !outcome.newly_started {
            debug!(
                frame = %key,
                request_id = outcome.request_id.as_u64(),
                "Joined in-flight frame id resolution"
            );
            return Ok(());
        }

        if let Err(e) = self.post_resolution(key, outcome.request_id) {
            let dropped = self.ledger.borrow_mut().discard(key);
            warn!(frame = %key, dropped, error = %e, "Failed to post frame id resolution");
            return Err(e);
        }
        Ok(())
    }

    /// Resolve `key`, delivering the result through a oneshot channel.
    ///
    /// The receiver completes once the map is pumped; a sentinel or cached key
    /// is already available on return.
    pub fn resolve(&self, key: FrameKey) -> Result<oneshot::Receiver<FrameIdPair>, FrameMapError> {
        let (sender, receiver) = oneshot::channel();
        self.resolve_async(key, move |value| {
            // Receiver may have been dropped; nothing to do then.
            let _ = sender.send(value);
        })?;
        Ok(receiver)
    }

    /// Resolve `key` and pump the completion queue until it is delivered.
    ///
    /// Fails with [`FrameMapError::ResolutionDropped`] when the owning task ends
    /// without an answer.
    pub async fn resolve_and_wait(&self, key: FrameKey) -> Result<FrameIdPair, FrameMapError> {
        let mut receiver = self.resolve(key)?;
        loop {
            match receiver.try_recv() {
                Ok(value) => return Ok(value),
                Err(oneshot::error::TryRecvError::Closed) => {
                    return Err(FrameMapError::ResolutionDropped(key));
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
            if self.wait_for_completions().await? == 0 {
                return Err(FrameMapError::ResolutionDropped(key));
            }
        }
    }

    /// Forget the cached ids for `key` after its frame is destroyed.
    ///
    /// Pending callbacks are untouched: an in-flight resolution still completes
    /// and repopulates the cache.
    pub fn invalidate(&self, key: FrameKey) -> bool {
        let removed = self.cache.remove(key).is_some();
        if removed {
            debug!(frame = %key, "Invalidated cached frame id");
        }
        removed
    }

    /// Deliver every completion already posted back by the owning thread.
    ///
    /// Never blocks. Bounded by `max_completions_per_pump` when it is non-zero.
    pub fn process_completions(&self) -> usize {
        self.pump(self.pump_budget())
    }

    /// Wait for at least one completion, then deliver whatever else is ready.
    ///
    /// Returns `Ok(0)` straight away when no resolution is outstanding.
    pub async fn wait_for_completions(&self) -> Result<usize, FrameMapError> {
        if self.outstanding.get() == 0 {
            return Ok(0);
        }

        let first = poll_fn(|cx| self.completion_rx.borrow_mut().poll_recv(cx)).await;
        let Some(first) = first else {
            return Err(FrameMapError::OwnerUnavailable(
                "completion channel closed".to_string(),
            ));
        };
        self.handle_completion(first);

        let rest = self.pump_budget().map(|budget| budget.saturating_sub(1));
        Ok(1 + self.pump(rest))
    }

    fn pump_budget(&self) -> Option<usize> {
        match self.config.max_completions_per_pump {
            0 => None,
            limit => Some(limit),
        }
    }

    fn pump(&self, budget: Option<usize>) -> usize {
        let mut handled = 0;
        while budget.map_or(true, |budget| handled < budget) {
            // The receiver borrow ends here so callbacks may pump re-entrantly.
            let next = self.completion_rx.borrow_mut().try_recv();
            let Ok(completion) = next else {
                break;
            };
            self.handle_completion(completion);
            handled += 1;
        }
        handled
    }

    fn post_resolution(&self, key: FrameKey, request_id: RequestId) -> Result<(), FrameMapError> {
        let cache = self.cache.clone();
        let resolver = Arc::clone(&self.resolver);
        let guard = CompletionGuard {
            key,
            request_id,
            completions: Some(self.completion_tx.clone()),
        };

        let posted = self.owner.post(Box::new(move || {
            // A seed may have landed since the request was made.
            let value = cache.peek(key).unwrap_or_else(|| resolver.resolve(key));
            guard.complete(value);
        }));
        if let Err(e) = posted {
            self.rejected.borrow_mut().insert(request_id);
            return Err(e);
        }

        self.outstanding.set(self.outstanding.get() + 1);
        debug!(
            frame = %key,
            request_id = request_id.as_u64(),
            "Posted frame id resolution to owning thread"
        );
        Ok(())
    }

    fn handle_completion(&self, completion: Completion) {
        let Completion {
            key,
            request_id,
            value,
        } = completion;
        let Some(value) = value else {
            self.handle_lost(key, request_id);
            return;
        };
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
        self.cache.insert(key, value);

        let callbacks = self.ledger.borrow_mut().drain_request(key, request_id);
        let Some(callbacks) = callbacks else {
            debug!(
                frame = %key,
                request_id = request_id.as_u64(),
                "Frame id completion had no waiting callbacks"
            );
            return;
        };

        debug!(
            frame = %key,
            frame_id = value.frame_id,
            parent_frame_id = value.parent_frame_id,
            callbacks = callbacks.len(),
            "Delivering resolved frame id"
        );
        for callback in callbacks {
            callback(value);
        }
    }

    /// The owning task ended without a value. Its callbacks are dropped, so
    /// oneshot waiters observe closure.
    fn handle_lost(&self, key: FrameKey, request_id: RequestId) {
        if self.rejected.borrow_mut().remove(&request_id) {
            return;
        }
        self.outstanding.set(self.outstanding.get().saturating_sub(1));

        let callbacks = self.ledger.borrow_mut().drain_request(key, request_id);
        warn!(
            frame = %key,
            request_id = request_id.as_u64(),
            dropped = callbacks.as_ref().map_or(0, Vec::len),
            "Frame id resolution ended without a result"
        );
    }

    /// Shared cache backing this map.
    pub fn cache(&self) -> &FrameIdCache {
        &self.cache
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    pub fn is_pending(&self, key: FrameKey) -> bool {
        self.ledger.borrow().is_in_flight(key)
    }

    pub fn pending_key_count(&self) -> usize {
        self.ledger.borrow().key_count()
    }

    pub fn pending_callback_count(&self) -> usize {
        self.ledger.borrow().callback_count()
    }

    /// Resolutions posted to the owning thread whose completions have not been handled.
    pub fn outstanding_resolutions(&self) -> usize {
        self.outstanding.get()
    }
}

impl Drop for FrameIdMap {
    fn drop(&mut self) {
        let ledger = self.ledger.get_mut();
        if !ledger.is_empty() {
            debug!(
                keys = ledger.key_count(),
                callbacks = ledger.callback_count(),
                "Dropping frame id map with undelivered callbacks"
            );
        }
    }
}
