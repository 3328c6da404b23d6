// SPDX-License-Identifier: GPL-3.0-only

//! Result handlers
//!
//! Routed results arrive here on the UI context. Results from a binding
//! that is no longer active are dropped, as are repeats of the payload that
//! was just acted on.

use crate::app::frame_processor::{RouteAction, RouteEvent};
use crate::app::state::{LastAction, Screen};
use crate::constants::messages;
use std::time::Instant;
use tracing::{debug, info, warn};

impl Screen {
    pub(crate) fn handle_routed(&mut self, event: RouteEvent) {
        if self.active_binding != Some(event.binding) {
            debug!(
                binding = event.binding,
                active = ?self.active_binding,
                "Ignoring result from a stale binding"
            );
            return;
        }

        let payload = event.action.payload();
        if self.is_repeat(payload) {
            debug!(sequence = event.sequence, "Suppressing repeated payload");
            return;
        }
        self.last_action = Some(LastAction {
            payload: payload.to_string(),
            at: Instant::now(),
        });

        match event.action {
            RouteAction::Dispatch { uri } => self.dispatch_uri(&uri),
            RouteAction::Display { text } => {
                info!(len = text.len(), "Showing scanned text");
                self.surface.show_dialog(messages::DIALOG_TITLE, &text);
            }
        }
    }

    fn is_repeat(&self, payload: &str) -> bool {
        let Some(window) = self.settings.repeat_suppression else {
            return false;
        };
        self.last_action
            .as_ref()
            .is_some_and(|last| last.payload == payload && last.at.elapsed() < window)
    }

    fn dispatch_uri(&mut self, uri: &str) {
        info!(uri, "Dispatching payment link");
        self.surface.notify(uri);
        if let Err(e) = self.launcher.launch(uri) {
            warn!(error = %e, "Could not hand the link to a payment app");
            self.surface.notify(messages::NO_HANDLER);
        }
    }

    pub(crate) fn handle_show_stats(&mut self) {
        let stats = self.analyzer.stats();
        self.surface.notify(&stats.to_string());
    }
}
