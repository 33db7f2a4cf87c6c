//! Tick-driven action node execution core.
//!
//! This library composes leaf actions into sequences and parallel groups,
//! runs them synchronously or across several host frames, and propagates
//! state and completion notifications through the tree.
//!
//! - **Single logical thread**: nodes are `Rc`-shared and never cross threads
//! - **Frame-based suspension**: a composite whose children report `Running`
//!   hands itself to the [`Scheduler`], which resumes it once per host frame
//! - **Referenced children**: composites hold weak references; a [`Scene`]
//!   owns the nodes
//!
//! # Architecture
//!
//! - [`ActionState`]: None, Success, Fail, Running or Error
//! - [`Action`]: leaf capability (`on_update`, `on_reset`)
//! - [`Node`]: reset / execute state machine shared by every kind
//! - Composite strategies: [`Policy::Sequence`], [`Policy::Parallel`],
//!   [`Policy::Execute`]
//! - [`AsyncProcessing`] and [`Scheduler`]: multi-frame episodes
//! - [`TriggerAdapter`]: binds host [`Signal`]s to root nodes

pub mod action;
pub mod bridge;
pub mod builder;
pub mod composite;
pub mod error;
pub mod leaves;
pub mod node;
pub mod observer;
pub mod scene;
pub mod scheduler;
pub mod state;
pub mod trigger;

// Re-export core types for ergonomic API
pub use action::{Action, AsAny, TickContext};
pub use bridge::AsyncProcessing;
pub use composite::Policy;
pub use error::TreeError;
pub use leaves::{Constant, FromFn, Log, Wait};
pub use node::{Node, NodeRef, WeakNode};
pub use observer::{Listener, ObserverList, StateListener};
pub use scene::{Firing, Scene};
pub use scheduler::{Scheduler, TaskHandle, TaskId, TickReport};
pub use state::ActionState;
pub use trigger::{Signal, Trigger, TriggerAdapter};
