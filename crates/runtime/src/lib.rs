//! Host runtime for action node scenes.
//!
//! This crate drives an [`action_node::Scene`] frame by frame on tokio,
//! loads scenes from RON blueprints, and broadcasts node activity to
//! subscribers.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the frame loop and its builder
//! - [`api`] exposes the handle and error types downstream clients use
//! - [`events`] provides the topic-based event bus
//! - [`blueprint`] parses scene descriptions and builds custom leaves
//! - [`config`] reads runtime settings from the environment
pub mod api;
pub mod blueprint;
pub mod config;
pub mod events;
pub mod runtime;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use blueprint::{
    ActionFactory, Blueprint, BlueprintError, LogLevel, NodeKindSpec, NodeSpec, Params,
    TriggerSpec,
};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, FrameEvent, NodeEvent, Topic};
pub use runtime::{RunSummary, Runtime, RuntimeBuilder, StopReason};
