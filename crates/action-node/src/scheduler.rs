//! Frame-driven scheduler for multi-frame episodes.
//!
//! The host calls [`Scheduler::tick`] once per logical frame. Every composite
//! that reported `Running` owns one task in the scheduler; the task resumes
//! the composite once per tick until it settles or is cancelled. The
//! scheduler never spawns threads and never blocks.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::{Node, NodeRef};

/// Identifier of a scheduled episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Handle to a scheduled episode, held by the owning node's bridge.
///
/// Stopping the handle prevents any further resumption; the scheduler drops
/// the task on its next tick.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    stopped: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

#[derive(Clone)]
struct Task {
    id: TaskId,
    node: Weak<Node>,
    stopped: Rc<Cell<bool>>,
}

/// Summary of one scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Frame number after the tick.
    pub frame: u64,
    /// Episodes resumed during the tick.
    pub polled: usize,
    /// Episodes that settled (or lost their node) during the tick.
    pub finished: usize,
}

#[derive(Default)]
struct Inner {
    frame: u64,
    next_id: u64,
    tasks: Vec<Task>,
    /// Task whose node is inside `resume` right now.
    resuming: Option<TaskId>,
}

/// Single-threaded tick source shared by every node of a tree.
///
/// Cloning is cheap; clones drive the same task list.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frame number (0 before the first tick).
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Number of live episodes.
    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .tasks
            .iter()
            .filter(|task| !task.stopped.get())
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Registers an episode that resumes `node` on every following tick.
    ///
    /// An episode spawned while another one is being resumed belongs to a
    /// descendant of that node, so it is queued ahead of it.
    pub fn spawn(&self, node: &NodeRef) -> TaskHandle {
        let mut inner = self.inner.borrow_mut();
        let id = TaskId(inner.next_id);
        inner.next_id += 1;

        let stopped = Rc::new(Cell::new(false));
        let task = Task {
            id,
            node: Rc::downgrade(node),
            stopped: Rc::clone(&stopped),
        };
        let slot = inner
            .resuming
            .and_then(|owner| inner.tasks.iter().position(|t| t.id == owner));
        match slot {
            Some(index) => inner.tasks.insert(index, task),
            None => inner.tasks.push(task),
        }

        trace!(
            target: "action_node::scheduler",
            task = %id,
            node = node.name(),
            frame = inner.frame,
            "episode scheduled"
        );

        TaskHandle { id, stopped }
    }

    /// Advances one frame and resumes every live episode once.
    ///
    /// Episodes are resumed in queue order, so nested episodes run before
    /// the episode that started them. Episodes spawned during this tick are
    /// first resumed on the next one.
    pub fn tick(&self) -> TickReport {
        let (frame, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            inner.frame += 1;
            inner.tasks.retain(|task| !task.stopped.get());
            (inner.frame, inner.tasks.clone())
        };

        let mut report = TickReport {
            frame,
            ..TickReport::default()
        };

        for task in snapshot {
            // A previous task in this tick may have cancelled this one.
            if task.stopped.get() {
                continue;
            }
            report.polled += 1;

            let still_running = match task.node.upgrade() {
                Some(node) => {
                    self.inner.borrow_mut().resuming = Some(task.id);
                    let running = node.resume(self);
                    self.inner.borrow_mut().resuming = None;
                    running
                }
                None => {
                    trace!(
                        target: "action_node::scheduler",
                        task = %task.id,
                        "node dropped, discarding episode"
                    );
                    false
                }
            };

            if !still_running {
                task.stopped.set(true);
                report.finished += 1;
            }
        }

        self.inner
            .borrow_mut()
            .tasks
            .retain(|task| !task.stopped.get());

        trace!(
            target: "action_node::scheduler",
            frame,
            polled = report.polled,
            finished = report.finished,
            "tick complete"
        );

        report
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("frame", &inner.frame)
            .field("tasks", &inner.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_frame_without_tasks() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.frame(), 0);

        let report = scheduler.tick();
        assert_eq!(report.frame, 1);
        assert_eq!(report.polled, 0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn stopped_handle_is_dropped_on_next_tick() {
        let scheduler = Scheduler::new();
        let node = Node::empty("idle").into_ref();

        let handle = scheduler.spawn(&node);
        assert_eq!(scheduler.pending(), 1);

        handle.stop();
        assert!(handle.is_stopped());
        assert_eq!(scheduler.pending(), 0);

        let report = scheduler.tick();
        assert_eq!(report.polled, 0);
    }

    #[test]
    fn dropped_node_finishes_its_task() {
        let scheduler = Scheduler::new();
        let node = Node::empty("gone").into_ref();
        let handle = scheduler.spawn(&node);
        drop(node);

        let report = scheduler.tick();
        assert_eq!(report.polled, 1);
        assert_eq!(report.finished, 1);
        assert!(handle.is_stopped());
    }
}
