// SPDX-License-Identifier: MPL-2.0

//! Exclusively-owned frame handle with exactly-once release
//!
//! A [`FrameBuffer`] is handed to the analyzer for every frame a binding
//! produces. Its release callback runs exactly once: either through
//! [`FrameBuffer::release`], which consumes the handle, or when the handle is
//! dropped on any other path (replaced by a newer frame, discarded on
//! shutdown, unwound by a panic).

use crate::backends::camera::CameraFrame;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Identifier of one camera binding
pub type BindingId = u64;

pub struct FrameBuffer {
    frame: Option<CameraFrame>,
    binding: BindingId,
    on_release: Option<ReleaseFn>,
}

impl FrameBuffer {
    /// Wrap a frame (or a missing image) produced by `binding`
    pub fn new<F>(frame: Option<CameraFrame>, binding: BindingId, on_release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            frame,
            binding,
            on_release: Some(Box::new(on_release)),
        }
    }

    /// A buffer nobody needs to hear about when it is released
    pub fn untracked(frame: Option<CameraFrame>, binding: BindingId) -> Self {
        Self {
            frame,
            binding,
            on_release: None,
        }
    }

    /// The image, or `None` when the source could not provide one
    pub fn frame(&self) -> Option<&CameraFrame> {
        self.frame.as_ref()
    }

    /// Binding that produced this buffer
    pub fn binding(&self) -> BindingId {
        self.binding
    }

    /// Hand the buffer back to its source
    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        self.frame = None;
        if let Some(on_release) = self.on_release.take() {
            on_release();
        }
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("binding", &self.binding)
            .field("has_image", &self.frame.is_some())
            .finish()
    }
}
