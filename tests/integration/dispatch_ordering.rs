//! Delivery ordering through a manually pumped owning queue

use frame_id_map::map::FrameIdMap;
use frame_id_map::task::ManualTaskQueue;
use frame_id_map::types::{FrameIdPair, FrameKey};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::integration::test_utils::{derived_ids, drain};

fn setup() -> (FrameIdMap, ManualTaskQueue) {
    let owner = ManualTaskQueue::new();
    let map = FrameIdMap::new(Arc::new(derived_ids), Arc::new(owner.clone()));
    (map, owner)
}

fn record(
    map: &FrameIdMap,
    log: &Rc<RefCell<Vec<(usize, FrameIdPair)>>>,
    index: usize,
    key: FrameKey,
) {
    let log = Rc::clone(log);
    map.resolve_async(key, move |ids| log.borrow_mut().push((index, ids)))
        .unwrap();
}

#[test]
fn test_interleaved_keys_deliver_grouped_in_post_order() {
    let (map, owner) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = FrameKey::new(1, 1);
    let b = FrameKey::new(2, 1);

    record(&map, &log, 0, a);
    record(&map, &log, 1, b);
    record(&map, &log, 2, a);
    record(&map, &log, 3, b);

    // One owning task per distinct key.
    assert_eq!(owner.len(), 2);
    assert_eq!(map.pending_key_count(), 2);
    assert_eq!(map.pending_callback_count(), 4);

    drain(&owner, &map);

    let order: Vec<usize> = log.borrow().iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 2, 1, 3]);
    assert_eq!(log.borrow()[0].1, derived_ids(a));
    assert_eq!(log.borrow()[2].1, derived_ids(b));
    assert_eq!(map.pending_key_count(), 0);
    assert_eq!(map.cache_len(), 2);
}

#[test]
fn test_sentinel_answers_while_other_keys_wait() {
    let (map, owner) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));

    record(&map, &log, 0, FrameKey::new(4, 4));
    record(&map, &log, 1, FrameKey::new(-1, 7));
    record(&map, &log, 2, FrameKey::new(4, -2));

    assert_eq!(*log.borrow(), vec![(1, FrameIdPair::INVALID), (2, FrameIdPair::INVALID)]);
    assert_eq!(owner.len(), 1);

    drain(&owner, &map);
    assert_eq!(log.borrow().len(), 3);
    assert_eq!(log.borrow()[2], (0, derived_ids(FrameKey::new(4, 4))));
}

#[test]
fn test_seed_on_owner_turns_later_requests_synchronous() {
    let (map, owner) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let key = FrameKey::new(9, 3);

    let handle = map.owner_handle();
    handle.seed(key, FrameIdPair::new(42, 0));

    record(&map, &log, 0, key);
    assert_eq!(*log.borrow(), vec![(0, FrameIdPair::new(42, 0))]);
    assert!(owner.is_empty());
    assert_eq!(map.cache_stats().hits, 1);
}

#[test]
fn test_destroyed_frame_resolves_fresh_after_invalidate() {
    let (map, owner) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let key = FrameKey::new(5, 5);

    map.owner_handle().seed(key, FrameIdPair::new(1, 0));
    assert!(map.owner_handle().invalidate(key));

    record(&map, &log, 0, key);
    assert!(log.borrow().is_empty());
    assert_eq!(owner.len(), 1);

    drain(&owner, &map);
    assert_eq!(*log.borrow(), vec![(0, derived_ids(key))]);
}

#[test]
fn test_closed_owner_rejects_new_work_and_keeps_cache_usable() {
    let (map, owner) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let cached = FrameKey::new(1, 2);

    record(&map, &log, 0, cached);
    drain(&owner, &map);
    owner.close();

    let result = map.resolve_async(FrameKey::new(8, 8), |_| {});
    assert!(result.is_err());
    assert!(!map.is_pending(FrameKey::new(8, 8)));

    // Cache hits and sentinels never touch the owning thread.
    record(&map, &log, 1, cached);
    record(&map, &log, 2, FrameKey::NONE);
    assert_eq!(log.borrow().len(), 3);
}
