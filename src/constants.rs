// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Payload matching
pub mod scheme {
    /// URI scheme prefix of UPI deep links
    pub const UPI_PREFIX: &str = "upi://";
}

/// User-visible strings
pub mod messages {
    /// Prefix of every camera menu entry label
    pub const CAMERA_LABEL_PREFIX: &str = "Camera ID ";

    /// Notification shown when the camera permission is refused
    pub const PERMISSION_DENIED: &str = "Camera permission denied";

    /// Notification shown when no application accepts a UPI link
    pub const NO_HANDLER: &str = "No UPI app found";

    /// Title of the modal that shows a decoded payload
    pub const DIALOG_TITLE: &str = "Scanned code";

    /// Notification shown after the user picks another camera
    pub fn switched_camera(id: &str) -> String {
        format!("Switched to camera ID: {}", id)
    }
}

/// Frame decoding parameters
pub mod decoding {
    /// Frames larger than this (in either dimension) are downscaled before decoding
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;

    /// Smallest dimension the downscaler will produce
    pub const MIN_DIMENSION: u32 = 64;
}

/// GStreamer pipeline settings
pub mod pipeline {
    /// Maximum number of buffers held by the appsink
    pub const MAX_BUFFERS: u32 = 2;

    /// Output format negotiated on the appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Default frame rate of the still-image backend
    pub const DEFAULT_STILL_FPS: u32 = 10;

    /// How long the analyzer worker waits for a frame before re-checking its stop signal
    pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Default window in which an identical payload is not acted on twice
    pub const DEFAULT_REPEAT_SUPPRESSION_MS: u64 = 3000;

    /// Timeout for pipeline start (seconds)
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Timeout for pipeline stop (seconds)
    pub const STOP_TIMEOUT_SECS: u64 = 2;
}

/// Supported image file extensions for the still-image backend
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
