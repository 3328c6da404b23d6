// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner
//!
//! None of these are fatal to the process: every failure degrades to
//! "preview without detection" or "detection without action".

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera backend errors (enumeration, binding)
    Camera(BackendError),
    /// Frame decoding errors
    Decode(DecodeError),
    /// External handler dispatch errors
    Dispatch(DispatchError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors produced by a frame decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame data does not match its declared geometry
    InvalidFrame(String),
    /// Decoder task panicked or was aborted
    TaskFailed(String),
}

/// Errors launching an external URI handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No application is registered for the URI
    NoHandler { uri: String, reason: String },
    /// The payload is not a URI the launcher accepts
    InvalidUri(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Dispatch(e) => write!(f, "Dispatch error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            DecodeError::TaskFailed(msg) => write!(f, "Decoder task failed: {}", msg),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NoHandler { uri, reason } => {
                write!(f, "No handler for {}: {}", uri, reason)
            }
            DispatchError::InvalidUri(uri) => write!(f, "Invalid URI: {}", uri),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for DispatchError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        AppError::Dispatch(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        DecodeError::InvalidFrame(err.to_string())
    }
}
