//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::sync::broadcast;

use super::Event;

/// Topics for event routing.
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// Signals dispatched to trigger adapters
    Signal,
    /// Node state transitions and completions
    Node,
    /// Per-frame scheduler reports
    Frame,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Signal, Topic::Node, Topic::Frame];
}

/// Topic-based event bus.
///
/// Channels are created up front and never change afterwards, so the map is
/// shared without a lock. Cloning the bus shares the channels.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publishes an event to its topic.
    ///
    /// Delivery is best-effort: an event published with no subscriber is
    /// dropped, and lagging subscribers lose the oldest events.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "scene_runtime::events", topic = %topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    /// Number of live receivers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FrameEvent;
    use action_node::Signal;

    #[test]
    fn events_route_to_their_topic_only() {
        let bus = EventBus::with_capacity(4);
        let mut signals = bus.subscribe(Topic::Signal);
        let mut frames = bus.subscribe(Topic::Frame);

        bus.publish(Event::Signal(Signal::Start));

        assert_eq!(signals.try_recv().unwrap(), Event::Signal(Signal::Start));
        assert!(frames.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new();
        bus.publish(Event::Frame(FrameEvent {
            frame: 1,
            polled: 0,
            finished: 0,
            pending: 0,
        }));

        let mut late = bus.subscribe(Topic::Frame);
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn clones_share_channels() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let mut rx = bus.subscribe(Topic::Signal);

        clone.publish(Event::Signal(Signal::Custom("door".into())));

        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Signal(Signal::Custom("door".into()))
        );
        assert_eq!(clone.subscriber_count(Topic::Signal), 1);
    }
}
