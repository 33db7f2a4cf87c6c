//! Scene blueprints.
//!
//! A blueprint is a RON document naming every node of a scene, how the
//! nodes are composed, and which host signals start which roots:
//!
//! ```ron
//! (
//!     name: "arena",
//!     nodes: [
//!         (name: "intro", kind: Sequence(["fade", "greet"])),
//!         (name: "fade", kind: Wait(frames: 3)),
//!         (name: "greet", kind: Log(message: "welcome")),
//!     ],
//!     triggers: [
//!         (on: Start, target: "intro"),
//!     ],
//! )
//! ```
//!
//! Instantiation runs in two passes (create every node, then wire the
//! references) so composites may name nodes declared after them.

mod error;
mod factory;

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{Level, debug};

use action_node::{ActionState, Constant, Log, Node, Scene, Trigger, Wait};

pub use error::BlueprintError;
pub use factory::{ActionConstructor, ActionFactory, Params, optional, required};

/// Declarative description of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKindSpec,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKindSpec {
    /// Children by name, run in order.
    Sequence(Vec<String>),
    /// Children by name, run together.
    Parallel(Vec<String>),
    /// Runs the named node as a single step.
    Execute(String),
    Wait {
        frames: u64,
    },
    Log {
        message: String,
        #[serde(default)]
        level: LogLevel,
    },
    Succeed,
    Fail,
    Empty,
    /// A host-defined leaf built through the [`ActionFactory`].
    Custom {
        kind: String,
        #[serde(default)]
        params: Params,
    },
}

impl NodeKindSpec {
    /// Names of the nodes this kind composes.
    pub fn references(&self) -> &[String] {
        match self {
            NodeKindSpec::Sequence(children) | NodeKindSpec::Parallel(children) => children,
            NodeKindSpec::Execute(target) => std::slice::from_ref(target),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub on: Trigger,
    pub target: String,
    /// `false` continues a live run instead of restarting it.
    #[serde(default = "default_restart")]
    pub restart: bool,
}

fn default_restart() -> bool {
    true
}

/// Verbosity of a `Log` leaf.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl Blueprint {
    pub fn from_ron_str(source: &str) -> Result<Self, BlueprintError> {
        Ok(ron::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BlueprintError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| BlueprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// Builds the scene with the built-in leaf kinds only.
    pub fn instantiate(&self) -> Result<Scene, BlueprintError> {
        self.instantiate_with(&ActionFactory::with_builtins())
    }

    /// Builds the scene, resolving `Custom` leaves through `factory`.
    pub fn instantiate_with(&self, factory: &ActionFactory) -> Result<Scene, BlueprintError> {
        let mut scene = Scene::new(&self.name);

        for spec in &self.nodes {
            let node = spec.build(factory)?;
            node.set_disabled(spec.disabled);
            scene.insert(node)?;
        }

        for spec in &self.nodes {
            for reference in spec.kind.references() {
                if scene.get(reference).is_none() {
                    return Err(BlueprintError::UnknownReference {
                        node: spec.name.clone(),
                        reference: reference.clone(),
                    });
                }
                scene.attach(&spec.name, reference)?;
            }
        }

        for trigger in &self.triggers {
            if scene.get(&trigger.target).is_none() {
                return Err(BlueprintError::UnknownTarget {
                    trigger: format!("{:?}", trigger.on),
                    target: trigger.target.clone(),
                });
            }
            scene.bind(trigger.on.clone(), &trigger.target, trigger.restart)?;
        }

        debug!(
            target: "scene_runtime::blueprint",
            scene = %self.name,
            nodes = scene.len(),
            triggers = self.triggers.len(),
            "blueprint instantiated"
        );
        Ok(scene)
    }
}

impl NodeSpec {
    fn build(&self, factory: &ActionFactory) -> Result<Node, BlueprintError> {
        let name = self.name.as_str();
        let node = match &self.kind {
            NodeKindSpec::Sequence(_) => Node::sequence(name),
            NodeKindSpec::Parallel(_) => Node::parallel(name),
            NodeKindSpec::Execute(_) => Node::execute_wrapper(name),
            NodeKindSpec::Wait { frames } => Node::leaf(name, Wait::frames(*frames)),
            NodeKindSpec::Log { message, level } => {
                Node::leaf(name, Log::with_level(message.clone(), (*level).into()))
            }
            NodeKindSpec::Succeed => Node::leaf(name, Constant(ActionState::Success)),
            NodeKindSpec::Fail => Node::leaf(name, Constant(ActionState::Fail)),
            NodeKindSpec::Empty => Node::empty(name),
            NodeKindSpec::Custom { kind, params } => {
                Node::boxed_leaf(name, factory.build(name, kind, params)?)
            }
        };
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_node::{Policy, Scheduler, Signal};

    const ARENA: &str = r#"
        (
            name: "arena",
            nodes: [
                (name: "intro", kind: Sequence(["fade", "greet"])),
                (name: "fade", kind: Wait(frames: 2)),
                (name: "greet", kind: Log(message: "welcome", level: Debug)),
                (name: "gate", kind: Custom(kind: "constant", params: {"state": "success"})),
                (name: "idle", kind: Empty, disabled: true),
            ],
            triggers: [
                (on: Start, target: "intro"),
                (on: SceneLoaded("arena"), target: "gate", restart: false),
            ],
        )
    "#;

    #[test]
    fn parses_every_section() {
        let blueprint = Blueprint::from_ron_str(ARENA).unwrap();

        assert_eq!(blueprint.name, "arena");
        assert_eq!(blueprint.nodes.len(), 5);
        assert_eq!(
            blueprint.nodes[2].kind,
            NodeKindSpec::Log {
                message: "welcome".into(),
                level: LogLevel::Debug
            }
        );
        assert!(blueprint.triggers[0].restart);
        assert!(!blueprint.triggers[1].restart);
        assert_eq!(
            blueprint.triggers[1].on,
            Trigger::SceneLoaded("arena".into())
        );
    }

    #[test]
    fn instantiate_wires_forward_references() {
        let scene = Blueprint::from_ron_str(ARENA).unwrap().instantiate().unwrap();
        let intro = scene.require("intro").unwrap();

        assert_eq!(intro.policy(), Some(Policy::Sequence));
        assert_eq!(
            intro
                .children()
                .iter()
                .map(|n| n.name().to_owned())
                .collect::<Vec<_>>(),
            vec!["fade", "greet"]
        );
        assert!(scene.require("idle").unwrap().is_disabled());
        assert_eq!(scene.triggers().len(), 2);
    }

    #[test]
    fn instantiated_scene_runs() {
        let scheduler = Scheduler::new();
        let scene = Blueprint::from_ron_str(ARENA).unwrap().instantiate().unwrap();

        let firings = scene.dispatch(&Signal::Start, &scheduler);
        assert_eq!(firings[0].state, ActionState::Running);

        scheduler.tick();
        scheduler.tick();
        assert_eq!(scene.require("intro").unwrap().state(), ActionState::Success);
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let source = r#"(name: "s", nodes: [(name: "root", kind: Parallel(["ghost"]))])"#;
        let err = Blueprint::from_ron_str(source)
            .unwrap()
            .instantiate()
            .unwrap_err();

        assert!(matches!(
            err,
            BlueprintError::UnknownReference { ref node, ref reference }
                if node == "root" && reference == "ghost"
        ));
    }

    #[test]
    fn unknown_trigger_target_is_rejected() {
        let source = r#"(name: "s", triggers: [(on: Awake, target: "nowhere")])"#;
        let err = Blueprint::from_ron_str(source)
            .unwrap()
            .instantiate()
            .unwrap_err();

        assert!(matches!(err, BlueprintError::UnknownTarget { ref target, .. } if target == "nowhere"));
    }

    #[test]
    fn duplicate_node_names_are_rejected() {
        let source = r#"
            (name: "s", nodes: [
                (name: "a", kind: Succeed),
                (name: "a", kind: Fail),
            ])
        "#;
        let err = Blueprint::from_ron_str(source)
            .unwrap()
            .instantiate()
            .unwrap_err();

        assert!(matches!(err, BlueprintError::Tree(_)));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            Blueprint::from_ron_str("(name: 3)"),
            Err(BlueprintError::Parse(_))
        ));
    }
}
