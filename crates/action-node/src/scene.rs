//! Scene container.
//!
//! A [`Scene`] owns the nodes of one or more trees. Composites and trigger
//! adapters only hold weak references, so removing a node from the scene
//! drops it and turns every reference to it into a structural error.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{ActionState, Node, NodeRef, Scheduler, Signal, Trigger, TriggerAdapter, TreeError};

/// Outcome of one adapter firing during [`Scene::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    pub node: String,
    pub state: ActionState,
}

#[derive(Debug)]
pub struct Scene {
    name: String,
    nodes: HashMap<String, NodeRef>,
    order: Vec<String>,
    triggers: RefCell<Vec<TriggerAdapter>>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HashMap::new(),
            order: Vec::new(),
            triggers: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Takes ownership of `node` under its name.
    pub fn insert(&mut self, node: Node) -> Result<NodeRef, TreeError> {
        if self.nodes.contains_key(node.name()) {
            return Err(TreeError::DuplicateNode {
                name: node.name().to_owned(),
            });
        }

        let name = node.name().to_owned();
        let node = node.into_ref();
        trace!(
            target: "action_node::scene",
            scene = %self.name,
            node = %name,
            kind = node.kind_label(),
            "node inserted"
        );
        self.nodes.insert(name.clone(), NodeRef::clone(&node));
        self.order.push(name);
        Ok(node)
    }

    pub fn get(&self, name: &str) -> Option<NodeRef> {
        self.nodes.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<NodeRef, TreeError> {
        self.get(name).ok_or_else(|| TreeError::UnknownNode {
            name: name.to_owned(),
        })
    }

    /// Appends `child` to the composite `parent`, both by name.
    pub fn attach(&self, parent: &str, child: &str) -> Result<(), TreeError> {
        let parent = self.require(parent)?;
        let child = self.require(child)?;
        parent.add_child(&child)
    }

    /// Releases ownership of a node. Returns it if it existed.
    ///
    /// The caller decides whether the node outlives the scene; once the
    /// returned reference is dropped, references from composites and
    /// triggers resolve to `Error`.
    pub fn remove(&mut self, name: &str) -> Option<NodeRef> {
        let node = self.nodes.remove(name)?;
        self.order.retain(|n| n != name);
        node.reset();
        Some(node)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> + '_ {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Binds `trigger` to the node named `target`.
    pub fn bind(&self, trigger: Trigger, target: &str, restart: bool) -> Result<(), TreeError> {
        let node = self.require(target)?;
        self.bind_adapter(TriggerAdapter::new(trigger, &node).with_restart(restart));
        Ok(())
    }

    pub fn bind_adapter(&self, adapter: TriggerAdapter) {
        self.triggers.borrow_mut().push(adapter);
    }

    pub fn triggers(&self) -> Vec<TriggerAdapter> {
        self.triggers.borrow().clone()
    }

    /// Fires every adapter matching `signal`, in binding order.
    pub fn dispatch(&self, signal: &Signal, scheduler: &Scheduler) -> Vec<Firing> {
        // Snapshot so listeners may bind new adapters while we fire.
        let adapters = self.triggers.borrow().clone();

        let firings: Vec<Firing> = adapters
            .iter()
            .filter_map(|adapter| {
                let state = adapter.fire(signal, scheduler)?;
                let node = adapter
                    .target()
                    .map(|n| n.name().to_owned())
                    .unwrap_or_default();
                Some(Firing { node, state })
            })
            .collect();

        debug!(
            target: "action_node::scene",
            scene = %self.name,
            signal = %signal,
            fired = firings.len(),
            "signal dispatched"
        );
        firings
    }

    /// Resets every node, cancelling all live episodes.
    pub fn reset_all(&self) {
        for node in self.nodes() {
            node.reset();
        }
    }
}
