// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! Converts camera frames to grayscale, downscales them for speed and runs
//! rqrr over the result. Decoding happens on the blocking pool so the
//! runtime stays responsive while a frame is being analyzed.

use super::FrameDecoder;
use crate::app::frame_processor::types::{DecodedPayload, FrameRegion};
use crate::backends::camera::{CameraFrame, PixelFormat};
use crate::constants::decoding;
use crate::errors::{DecodeError, DecodeResult};
use futures::future::BoxFuture;
use image::GrayImage;
use image::imageops::{self, FilterType};
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: decoding::DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(decoding::MIN_DIMENSION),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decode on the calling thread
    pub fn decode_blocking(&self, frame: &CameraFrame) -> DecodeResult<Vec<DecodedPayload>> {
        detect_sync(frame, self.max_dimension)
    }
}

impl FrameDecoder for QrDetector {
    fn decode(&self, frame: CameraFrame) -> BoxFuture<'static, DecodeResult<Vec<DecodedPayload>>> {
        let max_dim = self.max_dimension;
        // spawn_blocking is deferred to the first poll, which happens inside the runtime
        Box::pin(async move {
            tokio::task::spawn_blocking(move || detect_sync(&frame, max_dim))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "QR detection task panicked");
                    Err(DecodeError::TaskFailed(e.to_string()))
                })
        })
    }
}

/// Synchronous QR detection (runs in blocking task)
fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> DecodeResult<Vec<DecodedPayload>> {
    let start = std::time::Instant::now();

    let gray = to_luma(frame)?;
    let (gray, scale) = downscale(gray, max_dimension);

    let (proc_width, proc_height) = gray.dimensions();
    trace!(
        proc_width,
        proc_height,
        scale,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared grayscale image"
    );

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in grids {
        let content = match grid.decode() {
            Ok((_, content)) => content,
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR grid");
                continue;
            }
        };

        let xs = grid.bounds.iter().map(|p| p.x.max(0) as f32);
        let ys = grid.bounds.iter().map(|p| p.y.max(0) as f32);
        let (min_x, max_x) = xs.fold((f32::MAX, 0.0f32), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min_y, max_y) = ys.fold((f32::MAX, 0.0f32), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let region = FrameRegion::from_pixels(
            (min_x * scale) as u32,
            (min_y * scale) as u32,
            ((max_x - min_x) * scale) as u32,
            ((max_y - min_y) * scale) as u32,
            frame.width,
            frame.height,
        );

        debug!(
            len = content.len(),
            x = region.x,
            y = region.y,
            "Detected QR code"
        );
        payloads.push(DecodedPayload::new(content).with_region(region));
    }

    if !payloads.is_empty() {
        debug!(
            count = payloads.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    Ok(payloads)
}

/// Convert a frame to an 8-bit grayscale image, dropping stride padding
fn to_luma(frame: &CameraFrame) -> DecodeResult<GrayImage> {
    if !frame.is_consistent() {
        return Err(DecodeError::InvalidFrame(format!(
            "{}x{} frame with stride {} has only {} bytes",
            frame.width,
            frame.height,
            frame.stride,
            frame.data.len()
        )));
    }

    let pixels = frame.width as usize * frame.height as usize;
    let mut luma = Vec::with_capacity(pixels);
    for row in frame.rows() {
        match frame.format {
            PixelFormat::Gray8 => luma.extend_from_slice(row),
            PixelFormat::RGB24 | PixelFormat::RGBA => {
                let bpp = frame.format.bytes_per_pixel();
                luma.extend(row.chunks_exact(bpp).map(|px| luminance(px[0], px[1], px[2])));
            }
        }
    }

    GrayImage::from_raw(frame.width, frame.height, luma)
        .ok_or_else(|| DecodeError::InvalidFrame("luma buffer size mismatch".to_string()))
}

/// Standard luminance formula: Y = 0.299*R + 0.587*G + 0.114*B
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Shrink so neither side exceeds `max_dimension`; returns the image and the
/// factor that maps processed coordinates back to the original frame
fn downscale(gray: GrayImage, max_dimension: u32) -> (GrayImage, f32) {
    let (width, height) = gray.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return (gray, 1.0);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    let resized = imageops::resize(&gray, new_width, new_height, FilterType::Triangle);
    (resized, scale)
}
