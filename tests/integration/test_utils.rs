//! Shared test utilities for integration tests
//!
//! Environment variables are process-wide, so tests that set them go through
//! [`with_env`] to run one at a time and restore the previous values.

use frame_id_map::task::ManualTaskQueue;
use frame_id_map::types::{FrameIdPair, FrameKey};
use std::sync::Mutex;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set, restoring the originals afterwards.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, original) in saved {
        match original {
            Some(value) => std::env::set_var(&name, value),
            None => std::env::remove_var(&name),
        }
    }
    result
}

/// Ids derived from the key so a wrong delivery is easy to spot.
pub fn derived_ids(key: FrameKey) -> FrameIdPair {
    let base = key.process_id * 100 + key.routing_id;
    FrameIdPair::new(base, base + 1)
}

/// Alternate owning-thread tasks and requesting-thread pumps until both sides are idle.
pub fn drain(owner: &ManualTaskQueue, map: &frame_id_map::map::FrameIdMap) {
    loop {
        let ran = owner.run_until_idle();
        let delivered = map.process_completions();
        if ran == 0 && delivered == 0 {
            break;
        }
    }
}
