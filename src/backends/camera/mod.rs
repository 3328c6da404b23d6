// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   Screen (app)      │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← at most one bound stream
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← enumeration + stream creation
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌───────┐  ┌──────────┐
//!   │ Still │  │GStreamer │
//!   └───────┘  └──────────┘
//! ```
//!
//! Streams push frames into a [`FrameSink`]; they never know who consumes them.

pub mod frame_loop;
#[cfg(feature = "gstreamer")]
pub mod gst;
pub mod manager;
pub mod still;
pub mod types;

pub use manager::CameraBackendManager;
pub use types::*;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Camera backend trait
///
/// A backend knows how to list cameras and how to start a frame stream for
/// one of them.
pub trait CameraBackend: Send + Sync {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is usable on the current system
    fn is_available(&self) -> bool;

    /// Enumerate cameras on this backend
    ///
    /// Descriptors are returned even when their identifier is unknown; callers
    /// decide what to do with those.
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Start streaming frames from `device` into `sink`
    ///
    /// The stream runs until [`CameraStream::stop`] is called or it is dropped.
    fn open_stream(
        &self,
        device: &CameraDevice,
        sink: FrameSink,
    ) -> BackendResult<Box<dyn CameraStream>>;
}

/// A running camera stream
///
/// Dropping a stream stops it.
pub trait CameraStream: Send {
    /// Device this stream reads from
    fn device(&self) -> &CameraDevice;

    /// Stop delivering frames and release the device
    fn stop(&mut self) -> BackendResult<()>;

    /// Check if frames are still being produced
    fn is_running(&self) -> bool;
}

type SinkFn = dyn Fn(Option<CameraFrame>) + Send + Sync;

/// Destination for frames produced by a stream
///
/// `None` stands for a frame whose image could not be obtained (a buffer
/// that failed to map, a corrupted sample). Consumers still see it so that
/// the per-frame bookkeeping stays complete.
#[derive(Clone)]
pub struct FrameSink {
    deliver: Arc<SinkFn>,
}

impl FrameSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(Option<CameraFrame>) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// A sink that discards everything
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    /// Deliver a captured frame
    pub fn push(&self, frame: CameraFrame) {
        (self.deliver)(Some(frame));
    }

    /// Deliver a frame whose image is missing
    pub fn push_empty(&self) {
        (self.deliver)(None);
    }
}

impl std::fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSink").finish_non_exhaustive()
    }
}

/// Options needed to construct a backend
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Image files for the still backend
    pub still_sources: Vec<PathBuf>,
    /// Frame interval for the still backend
    pub still_frame_interval: Duration,
}

/// Get a concrete backend instance for the given type
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    options: &BackendOptions,
) -> BackendResult<Box<dyn CameraBackend>> {
    match backend_type {
        CameraBackendType::Still => Ok(Box::new(still::StillBackend::new(
            options.still_sources.clone(),
            options.still_frame_interval,
        ))),
        #[cfg(feature = "gstreamer")]
        CameraBackendType::GStreamer => Ok(Box::new(gst::GStreamerBackend::new())),
        #[cfg(not(feature = "gstreamer"))]
        CameraBackendType::GStreamer => Err(BackendError::NotAvailable(
            "built without the 'gstreamer' feature".to_string(),
        )),
    }
}
