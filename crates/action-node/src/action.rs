//! Leaf capability.
//!
//! This module defines the [`Action`] trait, the single capability every leaf
//! node exposes. The core invokes it uniformly, whatever the concrete action
//! does (toggle an object, play a tween, wait for a timer).

use std::any::Any;

use crate::{ActionState, Scheduler};

/// Per-invocation context handed to leaf actions.
pub struct TickContext<'a> {
    scheduler: &'a Scheduler,
    frame: u64,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(scheduler: &'a Scheduler) -> Self {
        Self {
            scheduler,
            frame: scheduler.frame(),
        }
    }

    /// Host frame the invocation belongs to.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Scheduler driving the current tree.
    #[inline]
    pub fn scheduler(&self) -> &'a Scheduler {
        self.scheduler
    }
}

/// Upcast helper so concrete leaves can be recovered from a `dyn Action`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A leaf action that can be evaluated by a node.
pub trait Action: AsAny {
    /// Evaluate the action for the current frame.
    ///
    /// Called once when the owning node is executed and again on every frame
    /// the enclosing composite resumes it while it reports `Running`.
    ///
    /// # Returns
    ///
    /// - `ActionState::Success` once the action has completed
    /// - `ActionState::Running` to be polled again on the next frame
    /// - `ActionState::Fail` if a precondition was not met
    /// - `ActionState::Error` if the action is misconfigured
    fn on_update(&mut self, ctx: &mut TickContext<'_>) -> ActionState;

    /// Release per-run resources. Called whenever the owning node resets.
    fn on_reset(&mut self) {}

    /// Runs after every update, whatever state it produced.
    fn on_post_update(&mut self, _state: ActionState) {}

    /// Short label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
