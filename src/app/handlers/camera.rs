// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles camera enumeration, menu selection and binding. At most one
//! camera is bound at a time: every bind is preceded by an unbind.

use crate::app::frame_processor::BindingId;
use crate::app::menu::CameraMenu;
use crate::app::state::{PermissionState, Screen};
use crate::backends::camera::FrameSink;
use crate::constants::messages;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl Screen {
    /// Enumerate cameras, build the menu and pick the initial camera
    pub(crate) fn setup_cameras(&mut self) {
        let cameras = self.manager.selectable_cameras();
        let ids: Vec<String> = cameras
            .iter()
            .filter_map(|camera| camera.camera_id().map(str::to_string))
            .collect();

        self.menu = CameraMenu::new(ids);
        self.selected_camera = self
            .settings
            .default_camera
            .as_deref()
            .and_then(|wanted| self.menu.resolve(wanted))
            .or_else(|| self.menu.ids().first().map(String::as_str))
            .map(str::to_string);
        self.available_cameras = cameras;
        self.provider_ready = true;

        info!(
            count = self.menu.len(),
            selected = ?self.selected_camera,
            "Camera setup complete"
        );
        if self.menu.is_empty() {
            warn!("No selectable cameras");
            self.surface.set_preview_active(false);
        }
        self.surface.set_menu(&self.menu.labels());
    }

    /// Bind the selected camera if the screen is allowed to run one
    pub(crate) fn start_camera(&mut self) {
        if self.permission_state != PermissionState::Granted || !self.provider_ready {
            debug!("Camera not ready to start");
            return;
        }
        if !self.visible {
            debug!("Screen not visible, deferring camera start");
            return;
        }

        self.stop_camera();

        let Some(id) = self.selected_camera.clone() else {
            debug!("No camera selected");
            self.surface.set_preview_active(false);
            return;
        };
        let Some(device) = self
            .available_cameras
            .iter()
            .find(|camera| camera.camera_id() == Some(id.as_str()))
            .cloned()
        else {
            warn!(camera = %id, "Selected camera is no longer enumerated");
            self.surface.set_preview_active(false);
            return;
        };

        let binding = self.analyzer.begin_binding();
        match self.manager.bind(&device, self.frame_sink(binding)) {
            Ok(()) => {
                info!(camera = %id, binding, "Camera bound");
                self.active_binding = Some(binding);
                self.surface.set_preview_active(true);
            }
            Err(e) => {
                error!(camera = %id, error = %e, "Use case binding failed");
                self.analyzer.end_binding();
                self.surface.set_preview_active(false);
            }
        }
    }

    /// Unbind whatever is running
    pub(crate) fn stop_camera(&mut self) {
        if let Some(device) = self.manager.unbind_all() {
            debug!(camera = %device.name, "Camera unbound");
        }
        if self.active_binding.take().is_some() {
            self.analyzer.end_binding();
        }
    }

    /// Sink that shows each frame and hands it to the analyzer
    fn frame_sink(&self, binding: BindingId) -> FrameSink {
        let analyzer = self.analyzer.handle();
        let preview = Arc::clone(&self.preview);
        FrameSink::new(move |frame| {
            if let Some(frame) = &frame {
                preview.present(frame);
            }
            analyzer.submit_frame(frame, binding);
        })
    }

    pub(crate) fn handle_select_camera(&mut self, selection: &str) {
        let Some(id) = self.menu.resolve(selection).map(str::to_string) else {
            warn!(selection, "Unknown camera selection");
            self.surface.notify(&format!("Unknown camera: {}", selection.trim()));
            return;
        };

        info!(camera = %id, "Camera selected");
        self.surface.notify(&messages::switched_camera(&id));
        self.selected_camera = Some(id);
        self.start_camera();
    }

    pub(crate) fn handle_show_menu(&mut self) {
        self.surface.set_menu(&self.menu.labels());
    }
}
