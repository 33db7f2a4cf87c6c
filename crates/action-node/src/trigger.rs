//! Trigger adapters.
//!
//! A [`TriggerAdapter`] binds one host [`Signal`] type to the execution of a
//! root node. Lifecycle signals come from the host; scene-loaded and custom
//! signals are data-driven pub/sub events.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::{ActionState, NodeRef, Scheduler, WeakNode};

/// A signal occurrence raised by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    Awake,
    Start,
    Enabled,
    Disabled,
    Destroy,
    /// A scene with the given name finished loading.
    SceneLoaded(String),
    /// Named application event.
    Custom(String),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Awake => write!(f, "awake"),
            Signal::Start => write!(f, "start"),
            Signal::Enabled => write!(f, "enabled"),
            Signal::Disabled => write!(f, "disabled"),
            Signal::Destroy => write!(f, "destroy"),
            Signal::SceneLoaded(name) => write!(f, "scene_loaded({name})"),
            Signal::Custom(name) => write!(f, "custom({name})"),
        }
    }
}

/// The signal type an adapter listens for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trigger {
    /// Never fires; the root is only executed explicitly.
    #[default]
    None,
    Awake,
    Start,
    Enabled,
    Disabled,
    Destroy,
    /// Fires when a scene with this exact name is loaded.
    SceneLoaded(String),
    /// Fires on the custom event with this exact name.
    Custom(String),
}

impl Trigger {
    pub fn matches(&self, signal: &Signal) -> bool {
        match (self, signal) {
            (Trigger::Awake, Signal::Awake)
            | (Trigger::Start, Signal::Start)
            | (Trigger::Enabled, Signal::Enabled)
            | (Trigger::Disabled, Signal::Disabled)
            | (Trigger::Destroy, Signal::Destroy) => true,
            (Trigger::SceneLoaded(expected), Signal::SceneLoaded(loaded)) => expected == loaded,
            (Trigger::Custom(expected), Signal::Custom(raised)) => expected == raised,
            _ => false,
        }
    }
}

/// Binds a [`Trigger`] to a root node.
#[derive(Debug, Clone)]
pub struct TriggerAdapter {
    trigger: Trigger,
    target: WeakNode,
    restart: bool,
}

impl TriggerAdapter {
    /// Adapter that restarts `target` on every matching signal.
    pub fn new(trigger: Trigger, target: &NodeRef) -> Self {
        Self {
            trigger,
            target: Rc::downgrade(target),
            restart: true,
        }
    }

    /// With `restart == false`, a matching signal continues the current run
    /// instead of starting a fresh one.
    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn restarts(&self) -> bool {
        self.restart
    }

    pub fn target(&self) -> Option<NodeRef> {
        self.target.upgrade()
    }

    /// Executes the target if `signal` matches.
    ///
    /// Returns `None` when the signal does not match, and `Error` when the
    /// target has been dropped.
    pub fn fire(&self, signal: &Signal, scheduler: &Scheduler) -> Option<ActionState> {
        if !self.trigger.matches(signal) {
            return None;
        }

        let Some(root) = self.target.upgrade() else {
            warn!(
                target: "action_node::trigger",
                signal = %signal,
                "trigger target was dropped"
            );
            return Some(ActionState::Error);
        };

        let state = root.execute(scheduler, self.restart);
        debug!(
            target: "action_node::trigger",
            signal = %signal,
            node = root.name(),
            state = %state,
            restart = self.restart,
            "trigger fired"
        );
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;
    use crate::leaves::Wait;

    #[test]
    fn lifecycle_matching() {
        assert!(Trigger::Start.matches(&Signal::Start));
        assert!(!Trigger::Start.matches(&Signal::Awake));
        assert!(!Trigger::None.matches(&Signal::Start));
    }

    #[test]
    fn scene_loaded_matches_by_name() {
        let trigger = Trigger::SceneLoaded("arena".into());

        assert!(trigger.matches(&Signal::SceneLoaded("arena".into())));
        assert!(!trigger.matches(&Signal::SceneLoaded("menu".into())));
        assert!(!trigger.matches(&Signal::Custom("arena".into())));
    }

    #[test]
    fn fire_executes_matching_target_only() {
        let scheduler = Scheduler::new();
        let root = Node::empty("root").into_ref();
        let adapter = TriggerAdapter::new(Trigger::Enabled, &root);

        assert_eq!(adapter.fire(&Signal::Disabled, &scheduler), None);
        assert_eq!(root.state(), ActionState::None);

        assert_eq!(
            adapter.fire(&Signal::Enabled, &scheduler),
            Some(ActionState::Success)
        );
    }

    #[test]
    fn dropped_target_reports_error() {
        let scheduler = Scheduler::new();
        let root = Node::empty("root").into_ref();
        let adapter = TriggerAdapter::new(Trigger::Start, &root);
        drop(root);

        assert_eq!(
            adapter.fire(&Signal::Start, &scheduler),
            Some(ActionState::Error)
        );
    }

    #[test]
    fn continue_mode_does_not_restart_running_root() {
        let scheduler = Scheduler::new();
        let wait = Node::leaf("wait", Wait::frames(3)).into_ref();
        let root = Node::sequence("root").into_ref();
        root.add_child(&wait).unwrap();
        let adapter = TriggerAdapter::new(Trigger::Custom("go".into()), &root).with_restart(false);

        assert_eq!(
            adapter.fire(&Signal::Custom("go".into()), &scheduler),
            Some(ActionState::Running)
        );
        scheduler.tick();

        // Second occurrence continues the live episode untouched.
        assert_eq!(
            adapter.fire(&Signal::Custom("go".into()), &scheduler),
            Some(ActionState::Running)
        );
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(wait.with_action::<Wait, _>(|w| w.remaining(1)), Some(Some(2)));
    }
}
