//! Public runtime API surface.
//!
//! Gathers the types handed to consumers of the runtime crate so the frame
//! loop and blueprint loading can stay focused on orchestration.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::RuntimeHandle;

pub(crate) use handle::Command;
