// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle handlers
//!
//! Creation checks the camera permission, a grant sets up the cameras, and
//! visibility decides whether a camera is bound. Pausing and destroying
//! unbind, so nothing keeps capturing behind a hidden screen.

use crate::app::platform::PermissionAnswer;
use crate::app::state::{PermissionState, Screen};
use crate::constants::messages;
use tracing::{debug, info, warn};

impl Screen {
    pub(crate) fn handle_created(&mut self) {
        info!("Scanner screen created");
        if self.permission.is_granted() {
            self.handle_permission_result(true);
        } else {
            self.request_permission();
        }
    }

    fn request_permission(&mut self) {
        match self.permission.request() {
            PermissionAnswer::Granted => self.handle_permission_result(true),
            PermissionAnswer::Denied => self.handle_permission_result(false),
            PermissionAnswer::Pending => {
                info!("Waiting for camera permission");
                self.permission_state = PermissionState::Pending;
            }
        }
    }

    pub(crate) fn handle_permission_result(&mut self, granted: bool) {
        if self.permission_state == PermissionState::Pending {
            self.permission.record_answer(granted);
        }

        if granted {
            info!("Camera permission granted");
            self.permission_state = PermissionState::Granted;
            if !self.provider_ready {
                self.setup_cameras();
            }
            self.start_camera();
        } else {
            warn!("Camera permission denied");
            self.permission_state = PermissionState::Denied;
            self.surface.notify(messages::PERMISSION_DENIED);
            self.surface.set_preview_active(false);
        }
    }

    pub(crate) fn handle_retry_permission(&mut self) {
        if self.permission_state == PermissionState::Granted {
            self.surface.notify("Camera permission already granted");
            return;
        }
        self.request_permission();
    }

    pub(crate) fn handle_resumed(&mut self) {
        debug!("Screen resumed");
        self.visible = true;
        self.start_camera();
    }

    pub(crate) fn handle_paused(&mut self) {
        debug!("Screen paused");
        self.visible = false;
        self.stop_camera();
        self.surface.set_preview_active(false);
    }

    /// Unbind and stop the analyzer; idempotent
    pub(crate) fn handle_destroyed(&mut self) {
        if self.destroyed {
            return;
        }
        info!("Scanner screen destroyed");
        self.visible = false;
        self.stop_camera();
        self.analyzer.shutdown();
        self.surface.set_preview_active(false);
        self.destroyed = true;
    }
}
