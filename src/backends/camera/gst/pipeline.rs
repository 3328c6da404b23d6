// SPDX-License-Identifier: MPL-2.0

//! GStreamer capture pipeline feeding a [`FrameSink`]

use crate::backends::camera::types::*;
use crate::backends::camera::{CameraStream, FrameSink};
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Running camera pipeline
pub struct GStreamerStream {
    device: CameraDevice,
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    running: bool,
}

impl GStreamerStream {
    /// Build and start `<source> ! videoconvert ! RGBA ! appsink`
    pub fn new(
        device: CameraDevice,
        gst_device: &gstreamer::Device,
        sink: FrameSink,
    ) -> BackendResult<Self> {
        info!(device = %device.name, "Creating camera pipeline");

        let source = gst_device
            .create_element(None)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        let convert = gstreamer::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let caps = gstreamer::Caps::builder("video/x-raw")
            .field("format", pipeline::OUTPUT_FORMAT)
            .build();
        let appsink = AppSink::builder()
            .caps(&caps)
            .max_buffers(pipeline::MAX_BUFFERS)
            .drop(true)
            .sync(false)
            .build();

        let gst_pipeline = gstreamer::Pipeline::new();
        gst_pipeline
            .add_many([&source, &convert, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        gstreamer::Element::link_many([&source, &convert, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let rotation = device.rotation;
        let mut sequence = 0u64;

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = sequence;
                    sequence += 1;

                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;

                    match frame_from_sample(&sample, rotation, frame_num) {
                        Some(frame) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(
                                    frame = frame_num,
                                    width = frame.width,
                                    height = frame.height,
                                    "Camera frame"
                                );
                            }
                            sink.push(frame);
                        }
                        None => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                warn!(frame = frame_num, "Sample without usable image");
                            }
                            sink.push_empty();
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        gst_pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            let _ = gst_pipeline.set_state(gstreamer::State::Null);
            BackendError::Busy(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, _) = gst_pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        if let Err(e) = result {
            error!(error = ?e, "Pipeline failed to reach PLAYING");
            let _ = gst_pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline did not start: {:?}",
                e
            )));
        }
        debug!(state = ?state, "Pipeline state");

        Ok(Self {
            device,
            pipeline: gst_pipeline,
            appsink,
            running: true,
        })
    }
}

/// Copy the mapped sample into an owned frame, `None` if anything is missing
fn frame_from_sample(
    sample: &gstreamer::Sample,
    rotation: SensorRotation,
    sequence: u64,
) -> Option<CameraFrame> {
    let buffer = sample.buffer()?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        return None;
    }
    let info = VideoInfo::from_caps(sample.caps()?).ok()?;
    let format = PixelFormat::from_gst_format(info.format().to_str())?;
    let map = buffer.map_readable().ok()?;

    let stride = u32::try_from(*info.stride().first()?).ok()?;
    Some(CameraFrame {
        width: info.width(),
        height: info.height(),
        data: Arc::from(map.as_slice()),
        format,
        stride,
        rotation,
        sequence,
        captured_at: Instant::now(),
    })
}

impl CameraStream for GStreamerStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn stop(&mut self) -> BackendResult<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        info!(device = %self.device.name, "Stopping camera pipeline");

        // Clear callbacks first so the sink closure (and its captures) is released
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, "Pipeline stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for GStreamerStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
