//! Property-based tests for delivery guarantees

use frame_id_map::map::FrameIdMap;
use frame_id_map::task::ManualTaskQueue;
use frame_id_map::types::{FrameIdPair, FrameKey};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::integration::test_utils::{derived_ids, drain};

#[derive(Debug, Clone)]
enum Op {
    Request(i32, i32),
    Invalidate(i32, i32),
    RunOwnerTask,
    Pump,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-1..4i32, -2..3i32).prop_map(|(p, r)| Op::Request(p, r)),
        1 => (0..4i32, 0..3i32).prop_map(|(p, r)| Op::Invalidate(p, r)),
        2 => Just(Op::RunOwnerTask),
        2 => Just(Op::Pump),
    ]
}

/// Every callback fires exactly once, with the right ids, and callbacks for one
/// key fire in registration order whatever the interleaving.
#[test]
fn test_callbacks_fire_once_in_per_key_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(op_strategy(), 1..60), |ops| {
            let owner = ManualTaskQueue::new();
            let map = FrameIdMap::new(Arc::new(derived_ids), Arc::new(owner.clone()));
            let delivered: Rc<RefCell<Vec<(FrameKey, usize, FrameIdPair)>>> =
                Rc::new(RefCell::new(Vec::new()));
            let mut issued = 0usize;

            for op in ops {
                match op {
                    Op::Request(p, r) => {
                        let key = FrameKey::new(p, r);
                        let seq = issued;
                        issued += 1;
                        let sink = Rc::clone(&delivered);
                        map.resolve_async(key, move |ids| sink.borrow_mut().push((key, seq, ids)))
                            .unwrap();
                    }
                    Op::Invalidate(p, r) => {
                        map.invalidate(FrameKey::new(p, r));
                    }
                    Op::RunOwnerTask => {
                        owner.run_next();
                    }
                    Op::Pump => {
                        map.process_completions();
                    }
                }
                prop_assert!(map.pending_key_count() <= map.outstanding_resolutions());
            }

            drain(&owner, &map);
            prop_assert_eq!(map.pending_callback_count(), 0);
            prop_assert_eq!(map.outstanding_resolutions(), 0);

            let delivered = delivered.borrow();
            prop_assert_eq!(delivered.len(), issued);

            let mut seen = vec![false; issued];
            let mut last_per_key: HashMap<FrameKey, usize> = HashMap::new();
            for (key, seq, ids) in delivered.iter() {
                prop_assert!(!seen[*seq], "callback {} fired twice", seq);
                seen[*seq] = true;

                let expected = if key.is_sentinel() {
                    FrameIdPair::INVALID
                } else {
                    derived_ids(*key)
                };
                prop_assert_eq!(*ids, expected);

                if let Some(previous) = last_per_key.insert(*key, *seq) {
                    prop_assert!(previous < *seq, "key {} delivered out of order", key);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Requests for distinct uncached keys post exactly one owning task per key.
#[test]
fn test_one_owning_task_per_distinct_key() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec((0..5i32, 0..5i32), 1..40),
            |keys| {
                let owner = ManualTaskQueue::new();
                let map = FrameIdMap::new(Arc::new(derived_ids), Arc::new(owner.clone()));

                let mut distinct = Vec::new();
                for (p, r) in &keys {
                    let key = FrameKey::new(*p, *r);
                    if !distinct.contains(&key) {
                        distinct.push(key);
                    }
                    map.resolve_async(key, |_| {}).unwrap();
                }

                prop_assert_eq!(owner.len(), distinct.len());
                prop_assert_eq!(map.pending_key_count(), distinct.len());
                prop_assert_eq!(map.pending_callback_count(), keys.len());

                drain(&owner, &map);
                prop_assert_eq!(map.cache_len(), distinct.len());
                Ok(())
            },
        )
        .unwrap();
}
