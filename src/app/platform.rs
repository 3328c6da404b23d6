// SPDX-License-Identifier: GPL-3.0-only

//! Platform services used by the scanner screen
//!
//! The screen never talks to a terminal, a permission prompt or the
//! desktop's URI handler directly; it goes through these traits. The
//! terminal implementations below are what the binary uses.

use crate::backends::camera::CameraFrame;
use crate::config::CameraPermission;
use crate::constants::timing;
use crate::errors::DispatchError;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Visible surface of the scanner screen
pub trait UiSurface: Send {
    /// Short-lived message (toast)
    fn notify(&mut self, text: &str);
    /// Modal message the user has to acknowledge
    fn show_dialog(&mut self, title: &str, body: &str);
    /// Replace the camera menu entries; an empty list means no menu
    fn set_menu(&mut self, entries: &[String]);
    /// Whether a camera preview is currently running
    fn set_preview_active(&mut self, active: bool);
}

/// Receives every captured frame for display, on the capture thread
pub trait PreviewSurface: Send + Sync {
    fn present(&self, frame: &CameraFrame);
}

/// Answer from a permission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAnswer {
    Granted,
    Denied,
    /// The user was asked; the answer arrives later as input
    Pending,
}

/// Access to the camera permission
pub trait PermissionGate: Send {
    /// Current grant, without asking
    fn is_granted(&self) -> bool;
    /// Ask for the permission
    fn request(&mut self) -> PermissionAnswer;
    /// Learn the answer to a [`PermissionAnswer::Pending`] request
    fn record_answer(&mut self, _granted: bool) {}
}

/// Hands URIs to whatever application is registered for them
pub trait UriLauncher: Send {
    fn launch(&self, uri: &str) -> Result<(), DispatchError>;
}

/// Prints the screen to stdout
#[derive(Debug, Default)]
pub struct TerminalSurface {
    preview_active: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiSurface for TerminalSurface {
    fn notify(&mut self, text: &str) {
        println!("» {}", text);
    }

    fn show_dialog(&mut self, title: &str, body: &str) {
        println!("┌─ {}", title);
        for line in body.lines() {
            println!("│ {}", line);
        }
        println!("└─");
    }

    fn set_menu(&mut self, entries: &[String]) {
        if entries.is_empty() {
            println!("No cameras available");
            return;
        }
        println!("Cameras:");
        for (index, entry) in entries.iter().enumerate() {
            println!("  [{}] {}", index + 1, entry);
        }
    }

    fn set_preview_active(&mut self, active: bool) {
        if self.preview_active != active {
            self.preview_active = active;
            println!("Preview {}", if active { "started" } else { "stopped" });
        }
    }
}

/// Preview that only logs frame statistics
#[derive(Debug, Default)]
pub struct LoggingPreview {
    frames: AtomicU64,
}

impl LoggingPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl PreviewSurface for LoggingPreview {
    fn present(&self, frame: &CameraFrame) {
        let count = self.frames.fetch_add(1, Ordering::Relaxed);
        if count % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = count,
                width = frame.width,
                height = frame.height,
                latency_us = frame.captured_at.elapsed().as_micros() as u64,
                "Preview frame"
            );
        }
    }
}

/// Permission gate backed by the configured grant
///
/// `Granted` and `Denied` are fixed for the session. `Prompt` asks on the
/// terminal; the answer comes back through the screen's input handling.
#[derive(Debug)]
pub struct TerminalPermission {
    state: CameraPermission,
}

impl TerminalPermission {
    pub fn new(state: CameraPermission) -> Self {
        Self { state }
    }
}

impl PermissionGate for TerminalPermission {
    fn is_granted(&self) -> bool {
        self.state == CameraPermission::Granted
    }

    fn request(&mut self) -> PermissionAnswer {
        match self.state {
            CameraPermission::Granted => PermissionAnswer::Granted,
            CameraPermission::Denied => PermissionAnswer::Denied,
            CameraPermission::Prompt => {
                println!("Allow camera access? [y/N]");
                PermissionAnswer::Pending
            }
        }
    }

    fn record_answer(&mut self, granted: bool) {
        // A "no" at the prompt is not remembered, so a retry asks again
        if granted && self.state == CameraPermission::Prompt {
            self.state = CameraPermission::Granted;
        }
    }
}

/// Launcher using the desktop's default handler
#[derive(Debug, Default)]
pub struct OpenLauncher;

/// Reject payloads that a desktop handler would misread as a file path or
/// split into several arguments
pub fn check_uri(uri: &str) -> Result<(), DispatchError> {
    let invalid = || DispatchError::InvalidUri(uri.to_string());
    let (scheme, rest) = uri.split_once(':').ok_or_else(invalid)?;

    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok || rest.is_empty() {
        return Err(invalid());
    }
    if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    Ok(())
}

impl UriLauncher for OpenLauncher {
    fn launch(&self, uri: &str) -> Result<(), DispatchError> {
        check_uri(uri)?;
        info!(uri, "Opening URI");
        open::that_detached(uri).map_err(|e| DispatchError::NoHandler {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
    }
}
