//! Builder utilities for ergonomic tree construction.
//!
//! This module provides helper functions to reduce boilerplate when building
//! trees. Instead of creating a composite and attaching children one by one,
//! you can write `sequence("intro", &[&fade, &spawn])`.

use std::rc::Rc;

use crate::composite::{Composite, Policy};
use crate::leaves::{Log, Wait};
use crate::node::NodeKind;
use crate::{Action, Node, NodeRef};

fn composite(name: impl Into<String>, policy: Policy, children: &[&NodeRef]) -> Node {
    let composite = Composite::new(policy);
    for child in children {
        composite.push(Rc::downgrade(child));
    }
    Node::with_kind(name, NodeKind::Composite(composite))
}

/// Creates a sequence node over `children`.
#[inline]
pub fn sequence(name: impl Into<String>, children: &[&NodeRef]) -> Node {
    composite(name, Policy::Sequence, children)
}

/// Creates a parallel node over `children`.
#[inline]
pub fn parallel(name: impl Into<String>, children: &[&NodeRef]) -> Node {
    composite(name, Policy::Parallel, children)
}

/// Creates an execute wrapper around `target`.
#[inline]
pub fn execute(name: impl Into<String>, target: &NodeRef) -> Node {
    composite(name, Policy::Execute, &[target])
}

/// Creates a leaf node.
///
/// Shorthand for `Node::leaf(name, action)`.
#[inline]
pub fn leaf(name: impl Into<String>, action: impl Action + 'static) -> Node {
    Node::leaf(name, action)
}

/// Creates a node with the default update, which succeeds immediately.
#[inline]
pub fn empty(name: impl Into<String>) -> Node {
    Node::empty(name)
}

/// Creates a [`Wait`] leaf.
#[inline]
pub fn wait(name: impl Into<String>, frames: u64) -> Node {
    Node::leaf(name, Wait::frames(frames))
}

/// Creates an info-level [`Log`] leaf.
#[inline]
pub fn log(name: impl Into<String>, message: impl Into<String>) -> Node {
    Node::leaf(name, Log::new(message))
}
