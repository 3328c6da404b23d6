// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! A task takes one camera frame and asynchronously produces the strings
//! encoded in it. The analyzer only sees the [`FrameDecoder`] trait so the
//! decoding library can be swapped without touching the pipeline.

pub mod qr_detector;

pub use qr_detector::QrDetector;

use super::types::DecodedPayload;
use crate::backends::camera::CameraFrame;
use crate::errors::DecodeResult;
use futures::future::BoxFuture;

/// Asynchronous barcode decoder
///
/// The returned future must be driven inside a tokio runtime. It may
/// complete after the caller has stopped caring; the analyzer races it
/// against binding cancellation.
pub trait FrameDecoder: Send + Sync {
    /// Decode every code visible in `frame`; an empty list means none were found
    fn decode(&self, frame: CameraFrame) -> BoxFuture<'static, DecodeResult<Vec<DecodedPayload>>>;
}
