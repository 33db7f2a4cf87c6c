//! Composition-time errors.
//!
//! Expected runtime outcomes are [`ActionState`](crate::ActionState) values;
//! these errors only surface while a tree is being assembled.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node `{name}` is already defined")]
    DuplicateNode { name: String },

    #[error("unknown node `{name}`")]
    UnknownNode { name: String },

    #[error("node `{name}` is not a composite and cannot hold children")]
    NotComposite { name: String },

    #[error("execute wrapper `{name}` already has a target")]
    WrapperArity { name: String },
}
