// SPDX-License-Identifier: GPL-3.0-only

//! Live camera backend built on GStreamer
//!
//! Cameras are discovered with a `DeviceMonitor` filtered on `Video/Source`.
//! Each stream is `<device source> ! videoconvert ! RGBA ! appsink`.

mod enumeration;
mod pipeline;

pub use enumeration::{camera_id_from_properties, enumerate_gst_cameras};
pub use pipeline::GStreamerStream;

use super::types::{BackendError, BackendResult, CameraBackendType, CameraDevice};
use super::{CameraBackend, CameraStream, FrameSink};
use tracing::warn;

/// GStreamer camera backend
#[derive(Debug, Default)]
pub struct GStreamerBackend;

impl GStreamerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for GStreamerBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::GStreamer
    }

    fn is_available(&self) -> bool {
        if let Err(e) = gstreamer::init() {
            warn!(error = %e, "GStreamer initialisation failed");
            return false;
        }
        gstreamer::ElementFactory::find("videoconvert").is_some()
            && gstreamer::ElementFactory::find("appsink").is_some()
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        match enumerate_gst_cameras() {
            Ok(cameras) => cameras.into_iter().map(|(camera, _)| camera).collect(),
            Err(e) => {
                warn!(error = %e, "Camera enumeration failed");
                Vec::new()
            }
        }
    }

    fn open_stream(
        &self,
        device: &CameraDevice,
        sink: FrameSink,
    ) -> BackendResult<Box<dyn CameraStream>> {
        let wanted = device
            .camera_id()
            .ok_or_else(|| BackendError::DeviceNotFound(device.name.clone()))?;

        // Devices are re-discovered so the element comes from a live handle
        let (camera, gst_device) = enumerate_gst_cameras()?
            .into_iter()
            .find(|(camera, _)| camera.camera_id() == Some(wanted))
            .ok_or_else(|| BackendError::DeviceNotFound(wanted.to_string()))?;

        let stream = GStreamerStream::new(camera, &gst_device, sink)?;
        Ok(Box::new(stream))
    }
}
