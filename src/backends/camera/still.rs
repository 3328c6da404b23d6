// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera backend
//!
//! Every configured image file is presented as a camera that keeps emitting
//! the same picture at a fixed rate. Useful on machines without a camera and
//! for exercising the scan pipeline against known codes.

use super::frame_loop::{LoopAction, LoopController};
use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame, PixelFormat,
};
use super::{CameraBackend, CameraStream, FrameSink};
use crate::constants::{file_formats, timing};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    debug!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::InitializationFailed(format!(
            "Failed to load image '{}': {}",
            path.display(),
            e
        ))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    debug!(width, height, "Image loaded");

    Ok(CameraFrame::packed(
        width,
        height,
        PixelFormat::RGBA,
        rgba.into_raw(),
    ))
}

/// Check whether a path looks like something the backend can serve
fn is_servable(path: &Path) -> bool {
    let has_image_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(file_formats::is_image_extension)
        .unwrap_or(false);

    has_image_extension && path.is_file()
}

/// Backend serving image files as cameras
pub struct StillBackend {
    sources: Vec<PathBuf>,
    frame_interval: Duration,
}

impl StillBackend {
    pub fn new(sources: Vec<PathBuf>, frame_interval: Duration) -> Self {
        let frame_interval = if frame_interval.is_zero() {
            Duration::from_secs(1) / timing::DEFAULT_STILL_FPS
        } else {
            frame_interval
        };
        Self {
            sources,
            frame_interval,
        }
    }
}

impl CameraBackend for StillBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Still
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.sources
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                let path_str = path.to_string_lossy().to_string();

                if is_servable(path) {
                    CameraDevice::new(index.to_string(), name, path_str)
                } else {
                    // Listed, but without an identifier it cannot be selected
                    warn!(path = %path.display(), "Still source is not a readable image");
                    CameraDevice::without_id(name, path_str)
                }
            })
            .collect()
    }

    fn open_stream(
        &self,
        device: &CameraDevice,
        sink: FrameSink,
    ) -> BackendResult<Box<dyn CameraStream>> {
        let path = PathBuf::from(&device.path);
        if !is_servable(&path) {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        }

        let template = load_image_as_frame(&path)?;
        let rotation = device.rotation;
        let interval = self.frame_interval;
        let mut sequence = 0u64;

        info!(
            device = %device.name,
            width = template.width,
            height = template.height,
            interval_ms = interval.as_millis() as u64,
            "Starting still-image stream"
        );

        let controller = LoopController::start("still-capture", move || {
            // Clones share the decoded pixels
            let frame = CameraFrame {
                rotation,
                sequence,
                captured_at: Instant::now(),
                ..template.clone()
            };
            sequence += 1;
            sink.push(frame);
            std::thread::sleep(interval);
            LoopAction::Continue
        })
        .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(Box::new(StillStream {
            device: device.clone(),
            controller: Some(controller),
        }))
    }
}

/// Running still-image stream
pub struct StillStream {
    device: CameraDevice,
    controller: Option<LoopController>,
}

impl CameraStream for StillStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn stop(&mut self) -> BackendResult<()> {
        if let Some(mut controller) = self.controller.take() {
            info!(device = %self.device.name, "Stopping still-image stream");
            controller.stop();
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.controller
            .as_ref()
            .map(LoopController::is_running)
            .unwrap_or(false)
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
