//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from command plumbing, scene composition and blueprint
//! loading so callers can bubble them up with consistent context.

use thiserror::Error;

use action_node::TreeError;

use crate::blueprint::BlueprintError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime command channel closed")]
    CommandChannelClosed,

    #[error("runtime command queue is full")]
    CommandQueueFull,

    #[error("runtime requires a scene or blueprint before building")]
    MissingScene,

    #[error("scene has no node named `{name}`")]
    UnknownRoot { name: String },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
}
