//! hushhands-daemon: Background daemon turning hand landmarks into gesture events
//!
//! This daemon runs alongside an external hand tracker and provides:
//! - Per-frame gesture classification from 21-point hand landmarks
//! - Majority-vote smoothing and per-action cooldowns
//! - A gesture-control / pass-through mode state machine
//! - Freehand annotation strokes driven by the draw gesture
//! - IPC server for trackers, action injectors and UIs
//!
//! Scope:
//! - Landmarks arrive over IPC; no camera capture or hand detection
//! - Actions are published as events; no OS input injection
//! - Annotation strokes live for the process lifetime only

mod annotation;
mod config;
mod dispatch;
mod events;
mod gesture;
mod ipc;
mod landmarks;
mod lifecycle;
mod pipeline;
mod stabilizer;
mod state;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::PipelineEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::pipeline::{Pipeline, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "hushhands-daemon starting"
    );

    // Load and validate configuration before any frame is processed
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        policy = %config.pipeline.gestures.policy,
        window = config.pipeline.gestures.min_frames_for_gesture,
        cooldown_s = config.pipeline.gestures.cooldown_seconds,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new()?;

    // IPC server -> pipeline (frames and annotation commands)
    let (input_tx, input_rx) = mpsc::channel(32);
    // Pipeline -> subscribers (injector, UIs, status tracking)
    let (event_tx, _event_rx) = broadcast::channel::<PipelineEvent>(256);

    let mut pipeline = Pipeline::new(Session::new(&config.pipeline), event_tx.clone());

    let server = Server::new(
        &config.socket_path,
        input_tx,
        event_tx.clone(),
        config.pipeline.gestures.policy,
    )?;

    let mut status_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Run the gesture pipeline (consumes frames in arrival order)
        _ = pipeline.run(input_rx) => {
            info!("pipeline exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the status snapshot in step with pipeline events
        _ = async {
            loop {
                match status_rx.recv().await {
                    Ok(event) => {
                        debug!(%event, "pipeline event");
                        server.record_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "status event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("status event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!(
        frames = pipeline.session().frames(),
        strokes = pipeline.session().annotations().committed().len(),
        "hushhands-daemon stopped"
    );

    Ok(())
}
