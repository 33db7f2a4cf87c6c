//! Registry of named leaf constructors.
//!
//! Blueprints describe `Custom` leaves by kind and string parameters. The
//! host registers one constructor per kind before instantiating a scene.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use action_node::{Action, ActionState, Constant, Log, Wait};

use super::{BlueprintError, LogLevel};

/// String parameters attached to a `Custom` leaf.
pub type Params = BTreeMap<String, String>;

/// Builds a leaf from its parameters, or explains why it cannot.
pub type ActionConstructor = Box<dyn Fn(&Params) -> Result<Box<dyn Action>, String>>;

#[derive(Default)]
pub struct ActionFactory {
    constructors: HashMap<String, ActionConstructor>,
}

impl ActionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the `constant`, `wait` and `log` kinds registered.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory
            .register("constant", |params| {
                let state: ActionState = required(params, "state")?;
                Ok(Box::new(Constant(state)))
            })
            .register("wait", |params| {
                let frames: u64 = required(params, "frames")?;
                Ok(Box::new(Wait::frames(frames)))
            })
            .register("log", |params| {
                let message: String = required(params, "message")?;
                let level = optional::<LogLevel>(params, "level")?.unwrap_or_default();
                Ok(Box::new(Log::with_level(message, level.into())))
            });
        factory
    }

    /// Registers `constructor` under `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Params) -> Result<Box<dyn Action>, String> + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Builds the leaf for blueprint node `node`.
    pub fn build(
        &self,
        node: &str,
        kind: &str,
        params: &Params,
    ) -> Result<Box<dyn Action>, BlueprintError> {
        let constructor =
            self.constructors
                .get(kind)
                .ok_or_else(|| BlueprintError::UnknownLeafKind {
                    node: node.to_owned(),
                    kind: kind.to_owned(),
                })?;

        constructor(params).map_err(|reason| BlueprintError::InvalidParam {
            node: node.to_owned(),
            reason,
        })
    }
}

impl fmt::Debug for ActionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Parses the parameter `key`, failing when it is absent.
pub fn required<T: FromStr>(params: &Params, key: &str) -> Result<T, String> {
    optional(params, key)?.ok_or_else(|| format!("missing parameter `{key}`"))
}

/// Parses the parameter `key` if present.
pub fn optional<T: FromStr>(params: &Params, key: &str) -> Result<Option<T>, String> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| format!("invalid value `{raw}` for parameter `{key}`"))
        })
        .transpose()
}
