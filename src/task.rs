//! Owning-thread task posting
//!
//! Work destined for the owning thread is a boxed `FnOnce` handed to a
//! [`TaskPoster`]. Posters must run tasks exactly once, in post order, on a
//! single thread. Two posters are provided: [`OwnerThread`] runs tasks on a
//! dedicated thread, [`ManualTaskQueue`] holds them until the host pumps it.

mod owner_thread;

pub use owner_thread::OwnerThread;

use crate::error::FrameMapError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// A unit of work for the owning thread.
pub type OwnerTask = Box<dyn FnOnce() + Send + 'static>;

/// FIFO, exactly-once delivery of tasks to the owning thread.
pub trait TaskPoster: Send + Sync {
    fn post(&self, task: OwnerTask) -> Result<(), FrameMapError>;
}

#[derive(Default)]
struct ManualQueueState {
    tasks: VecDeque<OwnerTask>,
    closed: bool,
}

/// Owning-side queue pumped explicitly by the host.
///
/// Whatever thread calls [`run_next`](Self::run_next) or
/// [`run_until_idle`](Self::run_until_idle) acts as the owning thread.
#[derive(Clone, Default)]
pub struct ManualTaskQueue {
    state: Arc<Mutex<ManualQueueState>>,
}

impl ManualTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the oldest pending task. Returns false when the queue was empty.
    pub fn run_next(&self) -> bool {
        // Release the lock before running: tasks may post more tasks.
        let task = self.state.lock().tasks.pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including ones posted meanwhile.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "Owning queue idle");
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    /// Refuse further posts. Tasks already queued can still be run.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }
}

impl TaskPoster for ManualTaskQueue {
    fn post(&self, task: OwnerTask) -> Result<(), FrameMapError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(FrameMapError::OwnerUnavailable(
                "manual task queue is closed".to_string(),
            ));
        }
        state.tasks.push_back(task);
        Ok(())
    }
}
