// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width.max(1) as f32;
        let fh = frame_height.max(1) as f32;
        Self {
            x: x as f32 / fw,
            y: y as f32 / fh,
            width: width as f32 / fw,
            height: height as f32 / fh,
        }
    }
}

/// A string decoded from a frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    /// Raw decoded text, untouched
    pub content: String,
    /// Where in the frame the code was found, if the decoder reports it
    pub region: Option<FrameRegion>,
}

impl DecodedPayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: FrameRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// Whether the payload carries any visible text
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// What the UI should do about a frame's payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Ask the platform to open this exact URI in a registered handler
    Dispatch { uri: String },
    /// Show this text verbatim in a modal dialog
    Display { text: String },
}

impl RouteAction {
    /// The payload text the action was derived from
    pub fn payload(&self) -> &str {
        match self {
            RouteAction::Dispatch { uri } => uri,
            RouteAction::Display { text } => text,
        }
    }
}

/// How the analyzer finished with one frame
///
/// Every variant ends with the frame buffer released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The buffer carried no image
    NoImage,
    /// The frame belonged to a binding that is no longer current
    Stale,
    /// Decoded and a payload matched the routing policy
    Matched,
    /// Decoded but nothing matched
    Unmatched,
    /// The decoder reported an error
    Failed,
    /// The binding was torn down while decoding
    Cancelled,
}
