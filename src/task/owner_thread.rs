//! Dedicated owning thread.

use super::{OwnerTask, TaskPoster};
use crate::error::FrameMapError;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

/// Runs posted tasks one at a time, in post order, on its own thread.
pub struct OwnerThread {
    name: String,
    sender: Mutex<Option<UnboundedSender<OwnerTask>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OwnerThread {
    /// Spawn the thread under the given name.
    pub fn spawn(name: impl Into<String>) -> Result<Self, FrameMapError> {
        let name = name.into();
        let (sender, receiver) = unbounded_channel::<OwnerTask>();
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_loop(&thread_name, receiver))?;

        debug!(thread = %name, "Owning thread started");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the queue and wait for the thread to finish every task already posted.
    pub fn shutdown(&self) -> Result<(), FrameMapError> {
        // Dropping the sender ends the loop once the backlog is drained.
        self.sender.lock().take();

        let Some(handle) = self.handle.lock().take() else {
            return Ok(());
        };
        if handle.thread().id() == thread::current().id() {
            return Ok(());
        }
        handle.join().map_err(|_| {
            FrameMapError::OwnerUnavailable(format!("owning thread '{}' panicked", self.name))
        })?;
        debug!(thread = %self.name, "Owning thread stopped");
        Ok(())
    }
}

impl TaskPoster for OwnerThread {
    fn post(&self, task: OwnerTask) -> Result<(), FrameMapError> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(FrameMapError::OwnerUnavailable(format!(
                "owning thread '{}' is shut down",
                self.name
            )));
        };
        sender.send(task).map_err(|_| {
            FrameMapError::OwnerUnavailable(format!("owning thread '{}' has exited", self.name))
        })
    }
}

impl Drop for OwnerThread {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(thread = %self.name, error = %e, "Owning thread did not stop cleanly");
        }
    }
}

fn run_loop(name: &str, mut receiver: UnboundedReceiver<OwnerTask>) {
    while let Some(task) = receiver.blocking_recv() {
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(thread = %name, "Owning-thread task panicked");
        }
    }
}
