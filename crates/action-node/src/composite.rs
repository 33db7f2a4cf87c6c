//! Composite execution strategies.
//!
//! Composite nodes control the execution flow of referenced child nodes.
//! This module provides the three strategies a [`Node`] can carry:
//! [`Policy::Sequence`] (ordered, short-circuit), [`Policy::Parallel`]
//! (every child every pass) and [`Policy::Execute`] (restart one target).
//!
//! The per-pass algorithm is the same whether it runs synchronously inside
//! `Node::execute` or once per frame from the scheduler, so single-frame and
//! multi-frame runs are observationally equivalent.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::{ActionState, AsyncProcessing, Node, NodeRef, Scheduler, WeakNode};

/// Ordering rule of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Policy {
    /// Executes children in order until one does not succeed.
    ///
    /// - `Success` advances the cursor to the next child
    /// - `Running` suspends the sequence at the same cursor
    /// - `Fail` / `Error` abort the sequence without advancing
    ///
    /// This is analogous to a short-circuited logical AND (&&) operation.
    Sequence,

    /// Executes every child once per pass, regardless of outcomes.
    ///
    /// The aggregate is `Success` iff every child succeeded, otherwise the
    /// first non-`Success` state in list order.
    Parallel,

    /// Executes a single target, restarting it on the first pass of each
    /// episode and continuing it afterwards.
    Execute,
}

pub(crate) struct Composite {
    policy: Policy,
    children: RefCell<Vec<WeakNode>>,
    cursor: Cell<usize>,
    launched: Cell<bool>,
    episode: RefCell<Option<AsyncProcessing>>,
}

impl Composite {
    pub(crate) fn new(policy: Policy) -> Self {
        Self {
            policy,
            children: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            launched: Cell::new(false),
            episode: RefCell::new(None),
        }
    }

    pub(crate) fn policy(&self) -> Policy {
        self.policy
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor.get()
    }

    pub(crate) fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub(crate) fn push(&self, child: WeakNode) {
        self.children.borrow_mut().push(child);
    }

    pub(crate) fn remove(&self, child: &NodeRef) -> bool {
        let target = Rc::downgrade(child);
        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|weak| !weak.ptr_eq(&target));
        children.len() != before
    }

    pub(crate) fn live_children(&self) -> Vec<NodeRef> {
        self.children
            .borrow()
            .iter()
            .filter_map(WeakNode::upgrade)
            .collect()
    }

    pub(crate) fn has_live_episode(&self) -> bool {
        self.episode
            .borrow()
            .as_ref()
            .is_some_and(AsyncProcessing::is_live)
    }

    /// Runs one pass of the strategy.
    pub(crate) fn step(&self, owner: &NodeRef, scheduler: &Scheduler) -> ActionState {
        match self.policy {
            Policy::Sequence => self.step_sequence(owner, scheduler),
            Policy::Parallel => self.step_parallel(owner, scheduler),
            Policy::Execute => self.step_execute(owner, scheduler),
        }
    }

    fn step_sequence(&self, owner: &NodeRef, scheduler: &Scheduler) -> ActionState {
        loop {
            let index = self.cursor.get();
            let Some(weak) = self.children.borrow().get(index).cloned() else {
                return ActionState::Success;
            };

            let state = match resolve(owner, index, &weak) {
                Ok(child) => child.execute(scheduler, false),
                Err(state) => state,
            };

            if !state.is_success() {
                return state;
            }
            self.cursor.set(index + 1);
        }
    }

    fn step_parallel(&self, owner: &NodeRef, scheduler: &Scheduler) -> ActionState {
        let children = self.children.borrow().clone();
        let mut aggregate = ActionState::Success;

        for (index, weak) in children.iter().enumerate() {
            let state = match resolve(owner, index, weak) {
                Ok(child) => child.execute(scheduler, false),
                Err(state) => state,
            };

            // First non-success in list order wins; later children still run.
            if aggregate.is_success() && !state.is_success() {
                aggregate = state;
            }
        }

        aggregate
    }

    fn step_execute(&self, owner: &NodeRef, scheduler: &Scheduler) -> ActionState {
        let Some(weak) = self.children.borrow().first().cloned() else {
            warn!(
                target: "action_node::composite",
                node = owner.name(),
                "execute wrapper has no target"
            );
            return ActionState::Error;
        };

        match resolve(owner, 0, &weak) {
            Ok(target) => {
                let restart = !self.launched.replace(true);
                target.execute(scheduler, restart)
            }
            Err(state) => state,
        }
    }

    /// Starts the multi-frame episode unless one is already live.
    pub(crate) fn begin_episode(&self, owner: &NodeRef, scheduler: &Scheduler) {
        let mut slot = self.episode.borrow_mut();
        if slot.as_ref().is_some_and(AsyncProcessing::is_live) {
            return;
        }

        let handle = scheduler.spawn(owner);
        let mut episode = AsyncProcessing::new(handle, scheduler.frame());
        let weak = Rc::downgrade(owner);
        episode.on_done(move |state| {
            if let Some(node) = weak.upgrade() {
                node.finish_episode(state);
            }
        });

        debug!(
            target: "action_node::composite",
            node = owner.name(),
            policy = %self.policy,
            task = ?episode.task_id(),
            frame = episode.started_at(),
            "episode started"
        );
        *slot = Some(episode);
    }

    pub(crate) fn take_episode(&self) -> Option<AsyncProcessing> {
        self.episode.borrow_mut().take()
    }

    pub(crate) fn cancel_episode(&self) {
        let Some(mut episode) = self.take_episode() else {
            return;
        };
        if episode.is_live() {
            debug!(
                target: "action_node::composite",
                task = ?episode.task_id(),
                "episode cancelled"
            );
        }
        episode.cancel();
    }

    /// Cancels the episode, rewinds the cursor and resets children.
    ///
    /// Execute wrappers do not reset their target: it is referenced, not
    /// part of the wrapper's structure.
    pub(crate) fn reset(&self, owner: &Node) {
        self.cancel_episode();
        self.cursor.set(0);
        self.launched.set(false);

        if self.policy == Policy::Execute {
            return;
        }

        let children = self.children.borrow().clone();
        for child in children.iter().filter_map(WeakNode::upgrade) {
            if std::ptr::eq(Rc::as_ptr(&child), owner) {
                continue;
            }
            child.reset();
        }
    }
}

/// Upgrades a child reference, rejecting dropped children and self-references.
fn resolve(owner: &NodeRef, index: usize, weak: &WeakNode) -> Result<NodeRef, ActionState> {
    let Some(child) = weak.upgrade() else {
        warn!(
            target: "action_node::composite",
            node = owner.name(),
            index,
            "child reference was dropped"
        );
        return Err(ActionState::Error);
    };

    if Rc::ptr_eq(&child, owner) {
        warn!(
            target: "action_node::composite",
            node = owner.name(),
            index,
            "composite references itself"
        );
        return Err(ActionState::Error);
    }

    Ok(child)
}
