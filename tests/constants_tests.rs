// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use upi_scanner::constants::{app_info, decoding, file_formats, messages, scheme};

#[test]
fn test_upi_scheme_prefix() {
    assert_eq!(scheme::UPI_PREFIX, "upi://");
}

#[test]
fn test_user_visible_messages() {
    assert_eq!(messages::CAMERA_LABEL_PREFIX, "Camera ID ");
    assert_eq!(messages::NO_HANDLER, "No UPI app found");
    assert_eq!(
        messages::switched_camera("1"),
        "Switched to camera ID: 1"
    );
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("png"));
    assert!(file_formats::is_image_extension("JPG"));
    assert!(!file_formats::is_image_extension("mp4"));
    assert!(!file_formats::is_image_extension(""));
}

#[test]
fn test_decode_dimensions() {
    assert!(decoding::MIN_DIMENSION < decoding::DEFAULT_MAX_DIMENSION);
}

#[test]
fn test_version_is_set() {
    assert!(!app_info::version().is_empty());
}
