//! Built-in leaf actions.
//!
//! Concrete engine-facing actions live with the host; these are the generic
//! building blocks every tree needs.

use std::fmt;

use tracing::{Level, debug, error, info, trace, warn};

use crate::{Action, ActionState, TickContext};

/// Always reports the wrapped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub ActionState);

impl Action for Constant {
    fn on_update(&mut self, _ctx: &mut TickContext<'_>) -> ActionState {
        self.0
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Reports `Running` until `frames` host frames have elapsed since its first
/// update, then `Success`.
///
/// A wait of zero frames succeeds immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wait {
    frames: u64,
    started_at: Option<u64>,
}

impl Wait {
    pub fn frames(frames: u64) -> Self {
        Self {
            frames,
            started_at: None,
        }
    }

    /// Frames left before the wait completes, if it has started.
    pub fn remaining(&self, frame: u64) -> Option<u64> {
        self.started_at
            .map(|start| self.deadline(start).saturating_sub(frame))
    }

    // Saturates so huge waits never finish instead of wrapping.
    fn deadline(&self, start: u64) -> u64 {
        start.saturating_add(self.frames)
    }
}

impl Action for Wait {
    fn on_update(&mut self, ctx: &mut TickContext<'_>) -> ActionState {
        let start = *self.started_at.get_or_insert(ctx.frame());
        if ctx.frame() >= self.deadline(start) {
            ActionState::Success
        } else {
            ActionState::Running
        }
    }

    fn on_reset(&mut self) {
        self.started_at = None;
    }

    fn name(&self) -> &str {
        "wait"
    }
}

/// Emits a log line through `tracing` and succeeds.
#[derive(Debug, Clone)]
pub struct Log {
    message: String,
    level: Level,
}

impl Log {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_level(message, Level::INFO)
    }

    pub fn with_level(message: impl Into<String>, level: Level) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Action for Log {
    fn on_update(&mut self, ctx: &mut TickContext<'_>) -> ActionState {
        let frame = ctx.frame();
        if self.level == Level::ERROR {
            error!(target: "action_node::log", frame, "{}", self.message);
        } else if self.level == Level::WARN {
            warn!(target: "action_node::log", frame, "{}", self.message);
        } else if self.level == Level::INFO {
            info!(target: "action_node::log", frame, "{}", self.message);
        } else if self.level == Level::DEBUG {
            debug!(target: "action_node::log", frame, "{}", self.message);
        } else {
            trace!(target: "action_node::log", frame, "{}", self.message);
        }
        ActionState::Success
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Leaf backed by a closure, for ad-hoc actions and host glue.
pub struct FromFn<F> {
    f: F,
}

impl<F> FromFn<F>
where
    F: FnMut(&mut TickContext<'_>) -> ActionState + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Action for FromFn<F>
where
    F: FnMut(&mut TickContext<'_>) -> ActionState + 'static,
{
    fn on_update(&mut self, ctx: &mut TickContext<'_>) -> ActionState {
        (self.f)(ctx)
    }

    fn name(&self) -> &str {
        "from_fn"
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, Scheduler};

    #[test]
    fn wait_counts_scheduler_frames() {
        let scheduler = Scheduler::new();
        let node = Node::leaf("wait", Wait::frames(2)).into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Running);
        scheduler.tick();
        assert_eq!(node.execute(&scheduler, false), ActionState::Running);
        assert_eq!(node.with_action::<Wait, _>(|w| w.remaining(1)), Some(Some(1)));
        scheduler.tick();
        assert_eq!(node.execute(&scheduler, false), ActionState::Success);
    }

    #[test]
    fn wait_restarts_after_reset() {
        let scheduler = Scheduler::new();
        let node = Node::leaf("wait", Wait::frames(1)).into_ref();

        node.execute(&scheduler, true);
        scheduler.tick();
        assert_eq!(node.execute(&scheduler, false), ActionState::Success);

        assert_eq!(node.execute(&scheduler, true), ActionState::Running);
    }

    #[test]
    fn zero_frame_wait_succeeds_immediately() {
        let scheduler = Scheduler::new();
        let node = Node::leaf("now", Wait::frames(0)).into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Success);
    }

    #[test]
    fn unbounded_wait_started_late_keeps_running() {
        let scheduler = Scheduler::new();
        scheduler.tick();
        let node = Node::leaf("forever", Wait::frames(u64::MAX)).into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Running);
        scheduler.tick();
        assert_eq!(node.execute(&scheduler, false), ActionState::Running);
        assert_eq!(
            node.with_action::<Wait, _>(|w| w.remaining(scheduler.frame())),
            Some(Some(u64::MAX - 2))
        );
    }

    #[test]
    fn log_always_succeeds() {
        let scheduler = Scheduler::new();
        let node = Node::leaf("log", Log::with_level("hello", Level::DEBUG)).into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Success);
        assert_eq!(
            node.with_action::<Log, _>(|l| l.message().to_owned())
                .as_deref(),
            Some("hello")
        );
    }
}
