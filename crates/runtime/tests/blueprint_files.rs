use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use action_node::{Action, ActionState, Signal, TickContext};
use scene_runtime::blueprint::required;
use scene_runtime::{
    ActionFactory, Blueprint, BlueprintError, Runtime, RuntimeConfig, RuntimeError, StopReason,
};
use tempfile::NamedTempFile;

/// Counts down a fixed number of updates, then succeeds.
struct Countdown {
    left: u32,
    updates: Rc<Cell<u32>>,
}

impl Action for Countdown {
    fn on_update(&mut self, _ctx: &mut TickContext<'_>) -> ActionState {
        self.updates.set(self.updates.get() + 1);
        if self.left == 0 {
            return ActionState::Success;
        }
        self.left -= 1;
        ActionState::Running
    }
}

fn write_blueprint(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(source.as_bytes()).expect("write blueprint");
    file
}

#[test]
fn loads_blueprint_from_disk() {
    let file = write_blueprint(
        r#"(
            name: "menu",
            nodes: [(name: "root", kind: Succeed)],
            triggers: [(on: Awake, target: "root")],
        )"#,
    );

    let blueprint = Blueprint::from_path(file.path()).unwrap();

    assert_eq!(blueprint.name, "menu");
    assert_eq!(blueprint.nodes.len(), 1);
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.ron");

    match Blueprint::from_path(&path) {
        Err(BlueprintError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn unregistered_custom_kind_fails_the_build() {
    let blueprint = Blueprint::from_ron_str(
        r#"(name: "s", nodes: [(name: "door", kind: Custom(kind: "toggle"))])"#,
    )
    .unwrap();

    let err = Runtime::builder().blueprint(blueprint).build().unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Blueprint(BlueprintError::UnknownLeafKind { .. })
    ));
}

#[tokio::test]
async fn custom_leaves_run_through_the_factory() {
    let file = write_blueprint(
        r#"(
            name: "vault",
            nodes: [
                (name: "open", kind: Execute("crank")),
                (name: "crank", kind: Custom(kind: "countdown", params: {"turns": "3"})),
            ],
            triggers: [(on: Custom("open_vault"), target: "open")],
        )"#,
    );

    let updates = Rc::new(Cell::new(0));
    let mut factory = ActionFactory::with_builtins();
    let counter = Rc::clone(&updates);
    factory.register("countdown", move |params| {
        let turns: u32 = required(params, "turns")?;
        Ok(Box::new(Countdown {
            left: turns,
            updates: Rc::clone(&counter),
        }))
    });

    let runtime = Runtime::builder()
        .config(
            RuntimeConfig::default()
                .with_frame_interval(Duration::from_millis(1))
                .with_max_frames(20)
                .stop_when_idle(true),
        )
        .blueprint(Blueprint::from_path(file.path()).unwrap())
        .actions(factory)
        .build()
        .unwrap();

    runtime
        .handle()
        .try_emit(Signal::Custom("open_vault".into()))
        .unwrap();
    let summary = runtime.run().await.unwrap();

    // One update on dispatch plus three resumed frames.
    assert_eq!(updates.get(), 4);
    assert_eq!(summary.reason, StopReason::Idle);
    assert_eq!(summary.frames, 3);
}
