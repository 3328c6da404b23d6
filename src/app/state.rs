// SPDX-License-Identifier: GPL-3.0-only

//! Scanner screen state and messages
//!
//! [`Screen`] is owned by the UI context and only ever mutated by
//! [`Screen::update`]. Work that happens elsewhere (the analyzer worker, the
//! stdin reader, signal handling) reaches it as a [`Message`] sent over the
//! UI channel.

use crate::app::frame_processor::{
    BindingId, FrameAnalyzer, FrameDecoder, ResultRouter, RouteEvent,
};
use crate::app::menu::CameraMenu;
use crate::app::platform::{PermissionGate, PreviewSurface, UiSurface, UriLauncher};
use crate::backends::camera::{CameraBackendManager, CameraDevice};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Everything that can happen to the screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ===== Lifecycle =====
    /// Screen created; checks the permission and sets up the cameras
    Created,
    /// Screen became visible
    Resumed,
    /// Screen is no longer visible
    Paused,
    /// Screen is going away for good
    Destroyed,

    // ===== Permission =====
    /// Answer to a pending permission request
    PermissionAnswered(bool),
    /// Ask for the camera permission again
    RetryPermission,

    // ===== Camera =====
    /// Menu selection: a label, a bare identifier, or a menu position
    SelectCamera(String),
    /// Print the camera menu again
    ShowMenu,

    // ===== Results =====
    /// A matched frame, redispatched from the analyzer worker
    Routed(RouteEvent),
    /// Print analyzer counters
    ShowStats,

    // ===== Terminal =====
    /// A line typed by the user
    Input(String),
}

/// Whether the UI loop keeps running after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Camera permission as far as the screen knows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionState {
    #[default]
    Unknown,
    /// The user has been asked and has not answered yet
    Pending,
    Granted,
    Denied,
}

/// Behaviour knobs of the screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenSettings {
    /// Identical payloads are not acted on again within this window
    pub repeat_suppression: Option<Duration>,
    /// Camera identifier to select first, if it is enumerated
    pub default_camera: Option<String>,
}

impl From<&Config> for ScreenSettings {
    fn from(config: &Config) -> Self {
        Self {
            repeat_suppression: config.repeat_suppression(),
            default_camera: config.default_camera.clone(),
        }
    }
}

/// Collaborators the screen is built from
pub struct ScreenParts {
    pub manager: CameraBackendManager,
    pub decoder: Arc<dyn FrameDecoder>,
    pub router: ResultRouter,
    pub surface: Box<dyn UiSurface>,
    pub preview: Arc<dyn PreviewSurface>,
    pub permission: Box<dyn PermissionGate>,
    pub launcher: Box<dyn UriLauncher>,
    pub settings: ScreenSettings,
}

/// The payload acted on most recently
#[derive(Debug, Clone)]
pub(crate) struct LastAction {
    pub payload: String,
    pub at: Instant,
}

/// The scanner screen
pub struct Screen {
    // ===== Collaborators =====
    pub(crate) manager: CameraBackendManager,
    pub(crate) analyzer: FrameAnalyzer,
    pub(crate) surface: Box<dyn UiSurface>,
    pub(crate) preview: Arc<dyn PreviewSurface>,
    pub(crate) permission: Box<dyn PermissionGate>,
    pub(crate) launcher: Box<dyn UriLauncher>,
    pub(crate) settings: ScreenSettings,

    // ===== Lifecycle =====
    pub(crate) permission_state: PermissionState,
    /// Cameras have been enumerated and the menu built
    pub(crate) provider_ready: bool,
    pub(crate) visible: bool,
    pub(crate) destroyed: bool,

    // ===== Camera =====
    /// Cameras with an identifier, as enumerated at setup
    pub(crate) available_cameras: Vec<CameraDevice>,
    pub(crate) menu: CameraMenu,
    pub(crate) selected_camera: Option<String>,
    /// Analyzer binding of the running camera, if any
    pub(crate) active_binding: Option<BindingId>,

    // ===== Results =====
    pub(crate) last_action: Option<LastAction>,
}

impl Screen {
    /// Build the screen and start its analyzer worker
    ///
    /// Routed results are sent to `ui_sender` as [`Message::Routed`].
    pub fn new(
        parts: ScreenParts,
        runtime: Handle,
        ui_sender: UnboundedSender<Message>,
    ) -> AppResult<Self> {
        let analyzer = FrameAnalyzer::start(parts.decoder, parts.router, runtime, move |event| {
            if ui_sender.send(Message::Routed(event)).is_err() {
                debug!("UI channel closed, dropping routed result");
            }
        })
        .map_err(|e| AppError::Other(format!("Failed to start frame analyzer: {}", e)))?;

        Ok(Self {
            manager: parts.manager,
            analyzer,
            surface: parts.surface,
            preview: parts.preview,
            permission: parts.permission,
            launcher: parts.launcher,
            settings: parts.settings,
            permission_state: PermissionState::Unknown,
            provider_ready: false,
            visible: false,
            destroyed: false,
            available_cameras: Vec::new(),
            menu: CameraMenu::default(),
            selected_camera: None,
            active_binding: None,
            last_action: None,
        })
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permission_state
    }

    pub fn selected_camera(&self) -> Option<&str> {
        self.selected_camera.as_deref()
    }

    pub fn menu(&self) -> &CameraMenu {
        &self.menu
    }

    pub fn active_binding(&self) -> Option<BindingId> {
        self.active_binding
    }

    pub fn is_bound(&self) -> bool {
        self.active_binding.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if !self.destroyed {
            self.handle_destroyed();
        }
    }
}
