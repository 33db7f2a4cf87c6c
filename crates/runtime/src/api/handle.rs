//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing. It is `Send`, so producers on
//! other tasks or threads can raise signals while the runtime itself stays
//! on one logical thread.

use tokio::sync::{broadcast, mpsc};

use action_node::Signal;

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};

/// Requests drained by the frame loop at the start of each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Emit(Signal),
    Shutdown,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone, Debug)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Queues `signal` for dispatch on the next frame.
    pub async fn emit(&self, signal: Signal) -> Result<()> {
        self.send(Command::Emit(signal)).await
    }

    /// Non-blocking variant of [`emit`](Self::emit).
    pub fn try_emit(&self, signal: Signal) -> Result<()> {
        self.command_tx
            .try_send(Command::Emit(signal))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => RuntimeError::CommandQueueFull,
                mpsc::error::TrySendError::Closed(_) => RuntimeError::CommandChannelClosed,
            })
    }

    /// Announces that the scene named `name` finished loading.
    pub async fn load_scene(&self, name: impl Into<String>) -> Result<()> {
        self.emit(Signal::SceneLoaded(name.into())).await
    }

    /// Raises a named custom event.
    pub async fn raise(&self, name: impl Into<String>) -> Result<()> {
        self.emit(Signal::Custom(name.into())).await
    }

    /// Asks the frame loop to stop after the current frame.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Signal` - Signals dispatched to the scene
    /// - `Topic::Node` - Node state transitions and completions
    /// - `Topic::Frame` - Per-frame scheduler reports
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Whether the runtime behind this handle has been dropped.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
