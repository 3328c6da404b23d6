// SPDX-License-Identifier: MPL-2.0

//! Main application module for the scanner
//!
//! # Architecture
//!
//! - `state`: Screen state types (Screen, Message, ScreenParts)
//! - `frame_processor`: Analyzer, decoder task and result router
//! - `platform`: UI, permission and URI launcher services
//! - `menu`: Camera selection menu
//! - `update`: Message handling
//! - `handlers`: Message handlers by domain
//!
//! The screen runs on a single UI task. Capture threads feed the analyzer,
//! the analyzer worker reports matches back over the UI channel, and a
//! dedicated thread turns stdin lines into [`Message::Input`].

pub mod frame_processor;
pub mod handlers;
pub mod menu;
pub mod platform;
mod state;
mod update;

pub use handlers::input::Command;
pub use state::{Flow, Message, PermissionState, Screen, ScreenParts, ScreenSettings};

use crate::backends::camera::{BackendOptions, CameraBackendManager};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use frame_processor::{QrDetector, ResultRouter};
use platform::{LoggingPreview, OpenLauncher, TerminalPermission, TerminalSurface};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

/// How long runtime shutdown waits for stray blocking tasks
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Backend construction options derived from the configuration
pub fn backend_options(config: &Config) -> BackendOptions {
    BackendOptions {
        still_sources: config.still_sources.clone(),
        still_frame_interval: config.still_frame_interval(),
    }
}

/// Screen collaborators for an interactive terminal session
pub fn terminal_parts(config: &Config) -> AppResult<ScreenParts> {
    let manager = CameraBackendManager::for_type(config.backend, &backend_options(config))?;
    if !manager.is_available() {
        warn!(backend = %config.backend, "Camera backend reports it is unavailable");
    }

    Ok(ScreenParts {
        manager,
        decoder: Arc::new(QrDetector::with_max_dimension(config.max_decode_dimension)),
        router: ResultRouter::new(config.router_policy, config.scheme_prefix.clone()),
        surface: Box::new(TerminalSurface::new()),
        preview: Arc::new(LoggingPreview::new()),
        permission: Box::new(TerminalPermission::new(config.camera_permission)),
        launcher: Box::new(OpenLauncher),
        settings: ScreenSettings::from(config),
    })
}

/// Run the interactive scanner until the user quits
pub fn run(config: Config) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("upi-scanner-rt")
        .build()
        .map_err(|e| AppError::Other(format!("Failed to start runtime: {}", e)))?;

    let result = runtime.block_on(run_screen(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run_screen(config: Config) -> AppResult<()> {
    info!(
        policy = %config.router_policy,
        backend = %config.backend,
        "Starting scanner"
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let parts = terminal_parts(&config)?;
    let mut screen = Screen::new(parts, tokio::runtime::Handle::current(), tx.clone())?;

    spawn_input_reader(tx.clone())?;

    let signal_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            let _ = signal_tx.send(Message::Destroyed);
        }
    });

    println!("{}", handlers::input::HELP);
    let _ = tx.send(Message::Created);
    let _ = tx.send(Message::Resumed);

    while let Some(message) = rx.recv().await {
        if screen.update(message) == Flow::Exit {
            break;
        }
    }

    if !screen.is_destroyed() {
        screen.update(Message::Destroyed);
    }
    info!("Scanner stopped");
    Ok(())
}

/// Forward stdin lines as messages from a dedicated thread
///
/// Blocking reads keep the runtime free of a task that can never finish;
/// the thread dies with the process.
fn spawn_input_reader(tx: UnboundedSender<Message>) -> AppResult<()> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(Message::Input(line)).is_err() {
                    break;
                }
            }
            debug!("Input reader finished");
        })
        .map(|_| ())
        .map_err(|e| AppError::Other(format!("Failed to start input reader: {}", e)))
}
