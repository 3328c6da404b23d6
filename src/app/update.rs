// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function is a dispatcher; the handling code lives in the
//! `handlers` submodules, organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::lifecycle`: creation, permission, visibility, teardown
//! - `handlers::camera`: enumeration, selection, binding
//! - `handlers::result`: routed results, dispatch, statistics
//! - `handlers::input`: terminal commands

use crate::app::state::{Flow, Message, Screen};
use tracing::debug;

impl Screen {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Flow {
        if self.destroyed {
            debug!(?message, "Screen destroyed, ignoring message");
            return Flow::Exit;
        }

        match message {
            // ===== Lifecycle =====
            Message::Created => self.handle_created(),
            Message::Resumed => self.handle_resumed(),
            Message::Paused => self.handle_paused(),
            Message::Destroyed => {
                self.handle_destroyed();
                return Flow::Exit;
            }

            // ===== Permission =====
            Message::PermissionAnswered(granted) => self.handle_permission_result(granted),
            Message::RetryPermission => self.handle_retry_permission(),

            // ===== Camera =====
            Message::SelectCamera(selection) => self.handle_select_camera(&selection),
            Message::ShowMenu => self.handle_show_menu(),

            // ===== Results =====
            Message::Routed(event) => self.handle_routed(event),
            Message::ShowStats => self.handle_show_stats(),

            // ===== Terminal =====
            Message::Input(line) => return self.handle_input(&line),
        }

        Flow::Continue
    }
}
