// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Image files served as cameras (always available)
    #[default]
    Still,
    /// Live capture through GStreamer device discovery
    GStreamer,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Still => write!(f, "still"),
            CameraBackendType::GStreamer => write!(f, "gstreamer"),
        }
    }
}

impl std::str::FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "still" => Ok(CameraBackendType::Still),
            "gstreamer" | "gst" => Ok(CameraBackendType::GStreamer),
            other => Err(format!(
                "unknown camera backend '{}' (expected 'still' or 'gstreamer')",
                other
            )),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Carried on every frame as orientation metadata. The QR decoder is
/// rotation invariant and ignores it; preview surfaces may use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Represents a camera device
///
/// `id` is the platform identifier used for selection and menu labels.
/// Backends fill it on a best-effort basis; descriptors without one are
/// not selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name
    pub name: String,
    /// Backend-specific path (file path, device node, ...)
    pub path: String,
    /// Platform identifier, if the backend could determine one
    pub id: Option<String>,
    /// Sensor rotation reported by the platform
    pub rotation: SensorRotation,
}

impl CameraDevice {
    /// Create a descriptor with a known identifier
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            id: Some(id.into()),
            rotation: SensorRotation::None,
        }
    }

    /// Create a descriptor whose identifier could not be determined
    pub fn without_id(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            id: None,
            rotation: SensorRotation::None,
        }
    }

    /// Platform identifier of this camera, `None` when unavailable
    pub fn camera_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
        }
    }

    /// Parse format from GStreamer format string
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGBA" | "RGBx" => Some(Self::RGBA),
            "RGB" => Some(Self::RGB24),
            "GRAY8" | "GREY" | "Y8" => Some(Self::Gray8),
            _ => None,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, rows `stride` bytes apart
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Orientation metadata
    pub rotation: SensorRotation,
    /// Monotonic frame number within one stream
    pub sequence: u64,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame (stride = width * bytes per pixel)
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format,
            stride: width * format.bytes_per_pixel() as u32,
            rotation: SensorRotation::None,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    /// Bytes of pixel data in one row, without padding
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Check that `data` covers every row of the declared geometry
    pub fn is_consistent(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let stride = self.stride as usize;
        if stride < self.row_bytes() {
            return false;
        }
        let needed = stride * (self.height as usize - 1) + self.row_bytes();
        self.data.len() >= needed
    }

    /// Pixel rows without stride padding
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let stride = self.stride as usize;
        let row_bytes = self.row_bytes();
        (0..self.height as usize).filter_map(move |y| {
            let start = y * stride;
            self.data.get(start..start + row_bytes)
        })
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend or stream
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Camera is in use by someone else
    Busy(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Busy(msg) => write!(f, "Camera busy: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_id_accessor() {
        assert_eq!(CameraDevice::new("0", "Front", "/dev/video0").camera_id(), Some("0"));
        assert_eq!(CameraDevice::without_id("Mystery", "").camera_id(), None);

        let mut empty = CameraDevice::new("", "Blank", "");
        assert_eq!(empty.camera_id(), None);
        empty.id = Some("1".into());
        assert_eq!(empty.camera_id(), Some("1"));
    }

    #[test]
    fn test_rotation_normalisation() {
        assert_eq!(SensorRotation::from_degrees_int(-90), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(450), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees_int(45), SensorRotation::None);
        assert_eq!(SensorRotation::Rotate270.to_string(), "270°");
    }

    #[test]
    fn test_frame_rows_skip_stride_padding() {
        let data: Vec<u8> = vec![
            1, 2, 0, // row 0 + padding
            3, 4, 0, // row 1 + padding
        ];
        let frame = CameraFrame {
            stride: 3,
            ..CameraFrame::packed(2, 2, PixelFormat::Gray8, data)
        };

        assert!(frame.is_consistent());
        let rows: Vec<&[u8]> = frame.rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3u8, 4][..]]);
    }

    #[test]
    fn test_truncated_frame_is_inconsistent() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::RGBA, vec![0u8; 10]);
        assert!(!frame.is_consistent());
    }
}
