//! High-level runtime orchestrator.
//!
//! The runtime owns a scene and its scheduler, drains commands from
//! [`RuntimeHandle`]s, ticks the scheduler once per frame and mirrors node
//! activity onto the [`EventBus`]. Nodes are `Rc`-shared, so the runtime
//! itself stays on one task; only the handle and the bus cross threads.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace};

use action_node::{
    ActionState, Firing, Listener, NodeRef, Scene, Scheduler, Signal, StateListener, TickReport,
};

use crate::api::{Command, Result, RuntimeError, RuntimeHandle};
use crate::blueprint::{ActionFactory, Blueprint};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, FrameEvent, NodeEvent, Topic};

/// Why [`Runtime::run`] returned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// A handle requested shutdown.
    Shutdown,
    /// The configured frame budget ran out.
    MaxFrames,
    /// Nothing was left running and `stop_when_idle` is set.
    Idle,
}

/// Outcome of a completed [`Runtime::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub scene: String,
    pub frames: u64,
    pub reason: StopReason,
}

/// Main runtime that drives a scene frame by frame.
///
/// [`RuntimeHandle`] provides a cloneable façade for producers that live on
/// other tasks.
pub struct Runtime {
    scene: Scene,
    scheduler: Scheduler,
    config: RuntimeConfig,
    event_bus: EventBus,
    handle: RuntimeHandle,
    command_rx: mpsc::Receiver<Command>,
    started: bool,
    shutdown_requested: bool,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.scheduler.frame()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Raises the startup lifecycle signals: Awake, Enabled, then Start.
    ///
    /// Calling it again is a no-op.
    pub fn start(&mut self) -> Vec<Firing> {
        if self.started {
            return Vec::new();
        }
        self.started = true;

        info!(
            target: "scene_runtime::runtime",
            scene = self.scene.name(),
            nodes = self.scene.len(),
            "scene starting"
        );

        [Signal::Awake, Signal::Enabled, Signal::Start]
            .into_iter()
            .flat_map(|signal| self.emit(signal))
            .collect()
    }

    /// Dispatches `signal` to the scene immediately.
    pub fn emit(&self, signal: Signal) -> Vec<Firing> {
        self.event_bus.publish(Event::Signal(signal.clone()));
        self.scene.dispatch(&signal, &self.scheduler)
    }

    /// Executes the named node directly, outside any trigger.
    pub fn execute(&self, name: &str, reset: bool) -> Result<ActionState> {
        let node = self
            .scene
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownRoot {
                name: name.to_owned(),
            })?;
        Ok(node.execute(&self.scheduler, reset))
    }

    /// Runs one frame: drains queued commands, then ticks the scheduler.
    ///
    /// Signals queued through a handle are dispatched before the tick, so an
    /// episode they start is already resumed by this frame's tick.
    pub fn step(&mut self) -> TickReport {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                Command::Emit(signal) => {
                    self.emit(signal);
                }
                Command::Shutdown => {
                    debug!(target: "scene_runtime::runtime", "shutdown requested");
                    self.shutdown_requested = true;
                }
            }
        }

        let report = self.scheduler.tick();
        let frame = FrameEvent {
            frame: report.frame,
            polled: report.polled,
            finished: report.finished,
            pending: self.scheduler.pending(),
        };
        trace!(
            target: "scene_runtime::runtime",
            frame = frame.frame,
            polled = frame.polled,
            finished = frame.finished,
            pending = frame.pending,
            "frame"
        );
        self.event_bus.publish(Event::Frame(frame));
        report
    }

    /// Drives frames on a tokio interval until a stop condition is met, then
    /// shuts the scene down.
    ///
    /// Starts the scene first if [`start`](Self::start) was not called.
    pub async fn run(mut self) -> Result<RunSummary> {
        self.start();

        let mut interval = time::interval(self.config.frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            interval.tick().await;
            self.step();

            if let Some(reason) = self.stop_reason() {
                break reason;
            }
        };

        let summary = RunSummary {
            scene: self.scene.name().to_owned(),
            frames: self.frame(),
            reason,
        };
        info!(
            target: "scene_runtime::runtime",
            scene = %summary.scene,
            frames = summary.frames,
            reason = %summary.reason,
            "scene stopped"
        );

        self.shutdown();
        Ok(summary)
    }

    /// Raises Disabled then Destroy and cancels every remaining episode.
    pub fn shutdown(&mut self) -> Vec<Firing> {
        let firings: Vec<Firing> = [Signal::Disabled, Signal::Destroy]
            .into_iter()
            .flat_map(|signal| self.emit(signal))
            .collect();

        self.scene.reset_all();
        self.started = false;
        firings
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.shutdown_requested {
            return Some(StopReason::Shutdown);
        }
        if let Some(max) = self.config.max_frames
            && self.frame() >= max
        {
            return Some(StopReason::MaxFrames);
        }
        if self.config.stop_when_idle && self.scheduler.is_idle() {
            return Some(StopReason::Idle);
        }
        None
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("scene", &self.scene.name())
            .field("frame", &self.frame())
            .field("started", &self.started)
            .finish()
    }
}

enum SceneSource {
    Scene(Scene),
    Blueprint(Blueprint),
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    source: Option<SceneSource>,
    factory: Option<ActionFactory>,
    event_bus: Option<EventBus>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            source: None,
            factory: None,
            event_bus: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Drive an already composed scene. Replaces any blueprint.
    pub fn scene(mut self, scene: Scene) -> Self {
        self.source = Some(SceneSource::Scene(scene));
        self
    }

    /// Instantiate the scene from `blueprint` at build time. Replaces any
    /// scene.
    pub fn blueprint(mut self, blueprint: Blueprint) -> Self {
        self.source = Some(SceneSource::Blueprint(blueprint));
        self
    }

    /// Leaf constructors for `Custom` blueprint nodes.
    ///
    /// If not provided, only the built-in kinds are available.
    pub fn actions(mut self, factory: ActionFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Publish onto an existing bus instead of creating one.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<Runtime> {
        let scene = match self.source.ok_or(RuntimeError::MissingScene)? {
            SceneSource::Scene(scene) => scene,
            SceneSource::Blueprint(blueprint) => {
                let factory = self.factory.unwrap_or_else(ActionFactory::with_builtins);
                blueprint.instantiate_with(&factory)?
            }
        };

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());
        let scheduler = Scheduler::new();

        for node in scene.nodes() {
            mirror_node(node, &event_bus, &scheduler);
        }

        debug!(
            target: "scene_runtime::runtime",
            scene = scene.name(),
            nodes = scene.len(),
            triggers = scene.triggers().len(),
            "runtime built"
        );

        Ok(Runtime {
            scene,
            scheduler,
            config: self.config,
            event_bus,
            handle,
            command_rx,
            started: false,
            shutdown_requested: false,
        })
    }
}

/// Republishes the node's transitions and completions on the bus.
fn mirror_node(node: &NodeRef, bus: &EventBus, scheduler: &Scheduler) {
    let name = node.name().to_owned();

    let on_state: StateListener = {
        let bus = bus.clone();
        let scheduler = scheduler.clone();
        let name = name.clone();
        Rc::new(move |state, previous| {
            bus.publish(Event::Node(NodeEvent::StateChanged {
                node: name.clone(),
                state,
                previous,
                frame: scheduler.frame(),
            }));
        })
    };
    node.on_state_changed(on_state);

    let on_complete: Listener = {
        let bus = bus.clone();
        let scheduler = scheduler.clone();
        Rc::new(move || {
            bus.publish(Event::Node(NodeEvent::Completed {
                node: name.clone(),
                frame: scheduler.frame(),
            }));
        })
    };
    node.on_complete(on_complete);
}
