//! Asynchronous execution bridge.
//!
//! An [`AsyncProcessing`] value represents one outstanding multi-frame
//! episode of a composite. It is created the first time a pass ends in
//! `Running` and destroyed when the episode settles or the owner resets.

use std::fmt;

use crate::{ActionState, TaskHandle, TaskId};

type Continuation = Box<dyn FnOnce(ActionState)>;

/// One live multi-frame episode.
pub struct AsyncProcessing {
    handle: Option<TaskHandle>,
    done: bool,
    started_at: u64,
    on_done: Option<Continuation>,
}

impl AsyncProcessing {
    pub fn new(handle: TaskHandle, started_at: u64) -> Self {
        Self {
            handle: Some(handle),
            done: false,
            started_at,
            on_done: None,
        }
    }

    /// Sets the continuation fired when the episode settles.
    pub fn on_done(&mut self, continuation: impl FnOnce(ActionState) + 'static) {
        self.on_done = Some(Box::new(continuation));
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// `true` while the episode is neither done nor cancelled.
    pub fn is_live(&self) -> bool {
        !self.done && self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.handle.as_ref().map(TaskHandle::id)
    }

    /// Frame on which the episode was started.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Marks the episode done and releases the task handle.
    ///
    /// Returns the completion continuation the first time only; the caller
    /// invokes it once its own borrows are released.
    pub fn mark_done(&mut self) -> Option<Continuation> {
        if self.done {
            return None;
        }
        self.done = true;
        self.handle = None;
        self.on_done.take()
    }

    /// Stops the task and discards the pending continuation.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
        self.on_done = None;
    }
}

impl fmt::Debug for AsyncProcessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncProcessing")
            .field("task", &self.task_id())
            .field("done", &self.done)
            .field("started_at", &self.started_at)
            .finish()
    }
}
