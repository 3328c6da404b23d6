// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for async frame analysis
//!
//! Camera frames flow through a keep-only-latest analyzer into a decoder
//! task; decoded strings are turned into UI actions by the router.

pub mod analyzer;
pub mod frame_buffer;
pub mod router;
pub mod tasks;
pub mod types;

pub use analyzer::{AnalyzerHandle, CancelToken, FrameAnalyzer, RouteEvent, StatsSnapshot};
pub use frame_buffer::{BindingId, FrameBuffer};
pub use router::ResultRouter;
pub use tasks::{FrameDecoder, QrDetector};
pub use types::{DecodedPayload, FrameOutcome, FrameRegion, RouteAction};
