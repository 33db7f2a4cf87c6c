use serde::{Deserialize, Serialize};

use action_node::{ActionState, Signal};

use super::Topic;

/// A node published a state transition, or completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    StateChanged {
        node: String,
        state: ActionState,
        previous: ActionState,
        frame: u64,
    },
    Completed {
        node: String,
        frame: u64,
    },
}

impl NodeEvent {
    pub fn node(&self) -> &str {
        match self {
            NodeEvent::StateChanged { node, .. } | NodeEvent::Completed { node, .. } => node,
        }
    }
}

/// Summary of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEvent {
    pub frame: u64,
    pub polled: usize,
    pub finished: usize,
    pub pending: usize,
}

/// Event wrapper carrying the typed payload of each topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A signal was dispatched to the scene's trigger adapters.
    Signal(Signal),
    Node(NodeEvent),
    Frame(FrameEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Signal(_) => Topic::Signal,
            Event::Node(_) => Topic::Node,
            Event::Frame(_) => Topic::Frame,
        }
    }
}
