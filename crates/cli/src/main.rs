//! Scene runner entry point.
//!
//! Loads a blueprint, raises `SceneLoaded` for it and drives the runtime
//! until it stops. Usage: `scene-runner [blueprint.ron]`, falling back to
//! `SCENE_BLUEPRINT`.
use std::path::{Path, PathBuf};

use action_node::Signal;
use anyhow::{Context, Result};
use scene_runtime::{ActionFactory, Blueprint, Event, Runtime, RuntimeConfig, Topic};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = setup_logging(std::env::var_os("SCENE_LOG_DIR").map(PathBuf::from).as_deref())?;

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SCENE_BLUEPRINT").ok())
        .context("usage: scene-runner <blueprint.ron> (or set SCENE_BLUEPRINT)")?;

    let blueprint = Blueprint::from_path(&path)
        .with_context(|| format!("failed to load blueprint {path}"))?;
    let scene_name = blueprint.name.clone();

    let runtime = Runtime::builder()
        .config(RuntimeConfig::from_env())
        .blueprint(blueprint)
        .actions(ActionFactory::with_builtins())
        .build()?;
    let handle = runtime.handle();

    if std::env::var("SCENE_EVENTS").is_ok() {
        let mut events = handle.subscribe(Topic::Node);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => print_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event printer lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            let _ = ctrl_c.shutdown().await;
        }
    });

    handle.try_emit(Signal::SceneLoaded(scene_name))?;
    let summary = runtime.run().await?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(%err, "failed to encode event"),
    }
}

/// Logs to stderr, and also to `scene-runner.log` under `log_dir` if given.
fn setup_logging(
    log_dir: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, "scene-runner.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(Some(guard))
}
