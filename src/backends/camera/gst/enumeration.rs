// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor

use crate::backends::camera::types::{BackendError, BackendResult, CameraDevice, SensorRotation};
use gstreamer::prelude::*;
use tracing::{debug, info};

/// Device properties that can carry a stable camera identifier, in order of preference
const ID_PROPERTIES: &[&str] = &[
    "api.libcamera.path",
    "api.v4l2.path",
    "device.path",
    "object.path",
];

/// Property holding the sensor mount rotation
const ROTATION_PROPERTY: &str = "api.libcamera.rotation";

/// Pick a camera identifier out of a device's property structure
///
/// Returns `None` when none of the known properties is present; such
/// cameras are listed but cannot be selected.
pub fn camera_id_from_properties(properties: &gstreamer::StructureRef) -> Option<String> {
    ID_PROPERTIES.iter().find_map(|key| {
        properties
            .get::<String>(*key)
            .ok()
            .filter(|value| !value.is_empty())
    })
}

fn rotation_from_properties(properties: &gstreamer::StructureRef) -> SensorRotation {
    if let Ok(degrees) = properties.get::<i32>(ROTATION_PROPERTY) {
        return SensorRotation::from_degrees_int(degrees);
    }
    properties
        .get::<String>(ROTATION_PROPERTY)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .map(SensorRotation::from_degrees_int)
        .unwrap_or_default()
}

/// Enumerate video sources, pairing each descriptor with its GStreamer device
pub fn enumerate_gst_cameras() -> BackendResult<Vec<(CameraDevice, gstreamer::Device)>> {
    gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    let _filter = monitor.add_filter(Some("Video/Source"), None);
    monitor
        .start()
        .map_err(|e| BackendError::InitializationFailed(format!("Device monitor: {}", e)))?;

    let devices = monitor.devices();
    monitor.stop();

    let cameras: Vec<(CameraDevice, gstreamer::Device)> = devices
        .into_iter()
        .map(|device| {
            let name = device.display_name().to_string();
            let (id, rotation) = match device.properties() {
                Some(props) => (
                    camera_id_from_properties(&props),
                    rotation_from_properties(&props),
                ),
                None => (None, SensorRotation::None),
            };

            debug!(name = %name, id = ?id, rotation = %rotation, "Discovered video source");

            let descriptor = CameraDevice {
                name,
                path: id.clone().unwrap_or_default(),
                id,
                rotation,
            };
            (descriptor, device)
        })
        .collect();

    info!(count = cameras.len(), "Enumerated GStreamer cameras");
    Ok(cameras)
}
