//! Node state machine.
//!
//! A [`Node`] is the executable unit of an action tree. Its behaviour is a
//! tagged union: an empty node, a leaf wrapping an [`Action`], or a
//! [`Composite`] strategy over referenced children. Every kind shares the same
//! reset / execute contract, state publication and completion notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::composite::{Composite, Policy};
use crate::observer::{Listener, ObserverList, StateListener};
use crate::{Action, ActionState, Scheduler, TickContext, TreeError};

/// Shared reference to a node. Node identity is the allocation.
pub type NodeRef = Rc<Node>;

/// Non-owning reference held by composites, triggers and the scheduler.
pub type WeakNode = Weak<Node>;

pub(crate) enum NodeKind {
    Empty,
    Leaf(RefCell<Box<dyn Action>>),
    Composite(Composite),
}

/// An executable unit with a published [`ActionState`].
pub struct Node {
    name: String,
    kind: NodeKind,
    state: Cell<ActionState>,
    previous: Cell<ActionState>,
    disabled: Cell<bool>,
    updating: Cell<bool>,
    resetting: Cell<bool>,
    completed: RefCell<ObserverList<dyn Fn()>>,
    state_changed: RefCell<ObserverList<dyn Fn(ActionState, ActionState)>>,
}

impl Node {
    pub(crate) fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: Cell::new(ActionState::None),
            previous: Cell::new(ActionState::None),
            disabled: Cell::new(false),
            updating: Cell::new(false),
            resetting: Cell::new(false),
            completed: RefCell::new(ObserverList::new()),
            state_changed: RefCell::new(ObserverList::new()),
        }
    }

    /// A node without behaviour: succeeds on its first run and then holds
    /// its state until reset.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Empty)
    }

    /// A leaf node driven by `action`.
    pub fn leaf(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self::with_kind(name, NodeKind::Leaf(RefCell::new(Box::new(action))))
    }

    /// A leaf node from an already boxed action.
    pub fn boxed_leaf(name: impl Into<String>, action: Box<dyn Action>) -> Self {
        Self::with_kind(name, NodeKind::Leaf(RefCell::new(action)))
    }

    /// An ordered composite that stops at the first non-`Success` child.
    pub fn sequence(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Composite(Composite::new(Policy::Sequence)))
    }

    /// A composite that evaluates every child on every pass.
    pub fn parallel(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Composite(Composite::new(Policy::Parallel)))
    }

    /// A wrapper that restarts a single referenced target on each episode.
    pub fn execute_wrapper(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Composite(Composite::new(Policy::Execute)))
    }

    pub fn into_ref(self) -> NodeRef {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currently published state.
    pub fn state(&self) -> ActionState {
        self.state.get()
    }

    /// State published before the current one.
    pub fn previous_state(&self) -> ActionState {
        self.previous.get()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// A disabled node fails every execution without side effects.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    /// Composite strategy, or `None` for leaves and empty nodes.
    pub fn policy(&self) -> Option<Policy> {
        match &self.kind {
            NodeKind::Composite(composite) => Some(composite.policy()),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Human-readable kind, used in logs.
    pub fn kind_label(&self) -> &'static str {
        match &self.kind {
            NodeKind::Empty => "empty",
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Composite(composite) => match composite.policy() {
                Policy::Sequence => "sequence",
                Policy::Parallel => "parallel",
                Policy::Execute => "execute",
            },
        }
    }

    /// Index of the next unresolved child of a sequence.
    pub fn cursor(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Composite(composite) if composite.policy() == Policy::Sequence => {
                Some(composite.cursor())
            }
            _ => None,
        }
    }

    /// `true` while a multi-frame episode of this composite is outstanding.
    pub fn has_live_episode(&self) -> bool {
        match &self.kind {
            NodeKind::Composite(composite) => composite.has_live_episode(),
            _ => false,
        }
    }

    pub fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Composite(composite) => composite.len(),
            _ => 0,
        }
    }

    /// Children that are still alive, in order.
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            NodeKind::Composite(composite) => composite.live_children(),
            _ => Vec::new(),
        }
    }

    /// Appends a child reference. The child is not owned by this node.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotComposite`] for leaves and empty nodes
    /// - [`TreeError::WrapperArity`] when an execute wrapper already has a target
    pub fn add_child(&self, child: &NodeRef) -> Result<(), TreeError> {
        match &self.kind {
            NodeKind::Composite(composite) => {
                if composite.policy() == Policy::Execute && composite.len() > 0 {
                    return Err(TreeError::WrapperArity {
                        name: self.name.clone(),
                    });
                }
                composite.push(Rc::downgrade(child));
                Ok(())
            }
            _ => Err(TreeError::NotComposite {
                name: self.name.clone(),
            }),
        }
    }

    /// Removes every reference to `child`. Returns `false` if none existed.
    pub fn remove_child(&self, child: &NodeRef) -> bool {
        match &self.kind {
            NodeKind::Composite(composite) => composite.remove(child),
            _ => false,
        }
    }

    /// Subscribes a success listener. Returns `false` if already subscribed.
    pub fn on_complete(&self, listener: Listener) -> bool {
        self.completed.borrow_mut().subscribe(listener)
    }

    /// Subscribes a success listener that fires once.
    pub fn on_complete_once(&self, listener: Listener) -> bool {
        self.completed.borrow_mut().subscribe_once(listener)
    }

    pub fn off_complete(&self, listener: &Listener) -> bool {
        self.completed.borrow_mut().unsubscribe(listener)
    }

    /// Subscribes a `(new, old)` state transition listener.
    pub fn on_state_changed(&self, listener: StateListener) -> bool {
        self.state_changed.borrow_mut().subscribe(listener)
    }

    pub fn off_state_changed(&self, listener: &StateListener) -> bool {
        self.state_changed.borrow_mut().unsubscribe(listener)
    }

    /// Runs `f` against the concrete leaf action, if it is a `T`.
    ///
    /// Returns `None` for other kinds, other action types, or while the
    /// action is being updated.
    pub fn with_action<T: Action, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let NodeKind::Leaf(cell) = &self.kind else {
            return None;
        };
        let action = cell.try_borrow().ok()?;
        (**action).as_any().downcast_ref::<T>().map(f)
    }

    /// Mutable variant of [`Node::with_action`].
    pub fn with_action_mut<T: Action, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let NodeKind::Leaf(cell) = &self.kind else {
            return None;
        };
        let mut action = cell.try_borrow_mut().ok()?;
        (**action).as_any_mut().downcast_mut::<T>().map(f)
    }

    /// Clears the current and previous state and releases per-run resources.
    ///
    /// Composites cancel their live episode, rewind their cursor and reset
    /// their children; execute wrappers leave their target untouched.
    pub fn reset(&self) {
        if self.resetting.replace(true) {
            return;
        }

        self.state.set(ActionState::None);
        self.previous.set(ActionState::None);

        match &self.kind {
            NodeKind::Empty => {}
            NodeKind::Leaf(cell) => {
                if let Ok(mut action) = cell.try_borrow_mut() {
                    action.on_reset();
                }
            }
            NodeKind::Composite(composite) => composite.reset(self),
        }

        self.resetting.set(false);
        trace!(target: "action_node::node", node = %self.name, "reset");
    }

    /// Executes the node for the current frame.
    ///
    /// - A disabled node returns `Fail` without touching its state.
    /// - With `reset`, the node starts a fresh run (cancelling any live
    ///   episode). Without it, the node continues its current run: a settled
    ///   node returns its held state and a composite with a live episode
    ///   reports `Running`, leaving progress to the scheduler.
    /// - On `Success`, completion listeners fire before returning.
    pub fn execute(self: &Rc<Self>, scheduler: &Scheduler, reset: bool) -> ActionState {
        if self.disabled.get() {
            trace!(target: "action_node::node", node = %self.name, "disabled, failing");
            return ActionState::Fail;
        }

        if self.updating.get() {
            warn!(
                target: "action_node::node",
                node = %self.name,
                "re-entrant execution, treating as structural error"
            );
            return ActionState::Error;
        }

        if reset {
            self.reset();
        } else {
            let held = self.state.get();
            if held.is_terminal() {
                return held;
            }
            if held.is_running() && self.has_live_episode() {
                return held;
            }
        }

        self.updating.set(true);
        let computed = self.update(scheduler);
        self.updating.set(false);

        let state = self.settle(computed);
        self.publish(state);
        if state.is_success() {
            self.notify_completed();
        }
        self.post_update(state);
        state
    }

    /// Runs `callback` once this node succeeds.
    ///
    /// If the node already holds `Success` and no reset is requested, the
    /// callback runs immediately. Otherwise it is registered as a one-shot
    /// listener and the node is executed.
    pub fn execute_then(
        self: &Rc<Self>,
        scheduler: &Scheduler,
        callback: Listener,
        reset_first: bool,
    ) -> ActionState {
        if !reset_first && self.state.get().is_success() {
            callback();
            return ActionState::Success;
        }

        self.completed.borrow_mut().subscribe_once(callback);
        self.execute(scheduler, reset_first)
    }

    /// Resumes the live episode of a composite. Returns `true` while it keeps
    /// running.
    pub(crate) fn resume(self: &Rc<Self>, scheduler: &Scheduler) -> bool {
        let NodeKind::Composite(composite) = &self.kind else {
            return false;
        };
        if !composite.has_live_episode() {
            return false;
        }

        if self.disabled.get() {
            debug!(
                target: "action_node::node",
                node = %self.name,
                "disabled mid-episode, cancelling"
            );
            composite.cancel_episode();
            return false;
        }

        if self.updating.get() {
            return true;
        }

        self.updating.set(true);
        let computed = composite.step(self, scheduler);
        self.updating.set(false);

        let state = self.settle(computed);
        self.publish(state);

        if state.is_running() {
            self.post_update(state);
            return true;
        }

        let continuation = composite.take_episode().and_then(|mut episode| episode.mark_done());
        if let Some(continuation) = continuation {
            continuation(state);
        }
        self.post_update(state);
        false
    }

    /// Called by the episode continuation once a multi-frame run settles.
    pub(crate) fn finish_episode(&self, state: ActionState) {
        debug!(
            target: "action_node::node",
            node = %self.name,
            state = %state,
            "episode finished"
        );
        if state.is_success() {
            self.notify_completed();
        }
    }

    fn update(self: &Rc<Self>, scheduler: &Scheduler) -> ActionState {
        match &self.kind {
            NodeKind::Empty => match self.state.get() {
                ActionState::None => ActionState::Success,
                held => held,
            },
            NodeKind::Leaf(cell) => match cell.try_borrow_mut() {
                Ok(mut action) => {
                    let mut ctx = TickContext::new(scheduler);
                    action.on_update(&mut ctx)
                }
                Err(_) => ActionState::Error,
            },
            NodeKind::Composite(composite) => {
                let state = composite.step(self, scheduler);
                if state.is_running() {
                    composite.begin_episode(self, scheduler);
                }
                state
            }
        }
    }

    /// Keeps the published state from regressing to `None` outside `reset`.
    fn settle(&self, computed: ActionState) -> ActionState {
        match computed {
            ActionState::None => match self.state.get() {
                ActionState::None => ActionState::Success,
                held => held,
            },
            state => state,
        }
    }

    fn publish(&self, state: ActionState) {
        let old = self.state.get();
        if old == state {
            return;
        }
        self.previous.set(old);
        self.state.set(state);

        debug!(
            target: "action_node::node",
            node = %self.name,
            state = %state,
            previous = %old,
            "state changed"
        );

        let listeners = self.state_changed.borrow_mut().take_dispatch();
        for listener in listeners {
            listener(state, old);
        }
    }

    fn notify_completed(&self) {
        let listeners = self.completed.borrow_mut().take_dispatch();
        for listener in listeners {
            listener();
        }
    }

    fn post_update(&self, state: ActionState) {
        if let NodeKind::Leaf(cell) = &self.kind
            && let Ok(mut action) = cell.try_borrow_mut()
        {
            action.on_post_update(state);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind_label())
            .field("state", &self.state.get())
            .field("disabled", &self.disabled.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaves::{Constant, FromFn};
    use std::cell::Cell;

    #[test]
    fn empty_node_succeeds_then_holds() {
        let scheduler = Scheduler::new();
        let node = Node::empty("noop").into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Success);
        assert_eq!(node.execute(&scheduler, false), ActionState::Success);
        assert_eq!(node.previous_state(), ActionState::None);
    }

    #[test]
    fn disabled_node_fails_without_update() {
        let scheduler = Scheduler::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let node = Node::leaf(
            "counted",
            FromFn::new(move |_| {
                counter.set(counter.get() + 1);
                ActionState::Success
            }),
        )
        .into_ref();
        node.set_disabled(true);

        assert_eq!(node.execute(&scheduler, true), ActionState::Fail);
        assert_eq!(calls.get(), 0);
        assert_eq!(node.state(), ActionState::None);
    }

    #[test]
    fn completion_fires_on_success_only() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let listener: Listener = Rc::new(move || counter.set(counter.get() + 1));

        let ok = Node::leaf("ok", Constant(ActionState::Success)).into_ref();
        let bad = Node::leaf("bad", Constant(ActionState::Fail)).into_ref();
        ok.on_complete(Rc::clone(&listener));
        bad.on_complete(Rc::clone(&listener));

        ok.execute(&scheduler, true);
        bad.execute(&scheduler, true);
        assert_eq!(fired.get(), 1);

        assert!(ok.off_complete(&listener));
        ok.execute(&scheduler, true);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn state_changed_reports_new_and_old() {
        let scheduler = Scheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let node = Node::leaf("ok", Constant(ActionState::Success)).into_ref();
        node.on_state_changed(Rc::new(move |new, old| log.borrow_mut().push((new, old))));

        node.execute(&scheduler, true);
        node.execute(&scheduler, false);

        assert_eq!(
            *seen.borrow(),
            vec![(ActionState::Success, ActionState::None)]
        );
    }

    #[test]
    fn execute_then_runs_immediately_when_already_successful() {
        let scheduler = Scheduler::new();
        let node = Node::empty("done").into_ref();
        node.execute(&scheduler, true);

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let state = node.execute_then(
            &scheduler,
            Rc::new(move || counter.set(counter.get() + 1)),
            false,
        );

        assert_eq!(state, ActionState::Success);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn execute_then_registers_one_shot_listener() {
        let scheduler = Scheduler::new();
        let node = Node::empty("fresh").into_ref();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let callback: Listener = Rc::new(move || counter.set(counter.get() + 1));

        node.execute_then(&scheduler, Rc::clone(&callback), true);
        node.execute(&scheduler, true);

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn leaf_returning_none_is_settled() {
        let scheduler = Scheduler::new();
        let node = Node::leaf("silent", Constant(ActionState::None)).into_ref();

        assert_eq!(node.execute(&scheduler, true), ActionState::Success);
    }

    #[test]
    fn typed_access_to_leaf_action() {
        let node = Node::leaf("fixed", Constant(ActionState::Fail));

        assert_eq!(
            node.with_action::<Constant, _>(|c| c.0),
            Some(ActionState::Fail)
        );
        node.with_action_mut::<Constant, _>(|c| c.0 = ActionState::Success);
        assert_eq!(
            node.with_action::<Constant, _>(|c| c.0),
            Some(ActionState::Success)
        );
        assert!(Node::empty("none").with_action::<Constant, _>(|_| ()).is_none());
    }

    #[test]
    fn add_child_to_leaf_is_rejected() {
        let leaf = Node::empty("leaf");
        let child = Node::empty("child").into_ref();

        assert!(matches!(
            leaf.add_child(&child),
            Err(TreeError::NotComposite { .. })
        ));
    }

    #[test]
    fn execute_wrapper_takes_one_target() {
        let wrapper = Node::execute_wrapper("call");
        let a = Node::empty("a").into_ref();
        let b = Node::empty("b").into_ref();

        assert!(wrapper.add_child(&a).is_ok());
        assert!(matches!(
            wrapper.add_child(&b),
            Err(TreeError::WrapperArity { .. })
        ));
    }
}
