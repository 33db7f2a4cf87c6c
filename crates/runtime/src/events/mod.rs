//! Topic-based event bus for scene runtime events.
//!
//! Node transitions, completions, dispatched signals and frame reports are
//! published to topics; consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{Event, FrameEvent, NodeEvent};
