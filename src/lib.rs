// SPDX-License-Identifier: MPL-2.0

//! UPI Scanner - a camera QR scanner for UPI payment links
//!
//! Frames from a camera are analyzed one at a time for QR codes. A decoded
//! `upi://` link is handed to whatever payment application is registered
//! for it; in display mode any decoded text is shown instead.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Scanner screen, frame analyzer, decoder and result routing
//! - [`backends`]: Camera backend abstraction (still images, GStreamer)
//! - [`config`]: User configuration handling
//! - [`constants`]: Application-wide constants
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! // Typically run via:
//! // upi-scanner --backend gstreamer
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use app::frame_processor::{DecodedPayload, RouteAction};
pub use app::{Message, Screen};
pub use config::{Config, RouterPolicy};
