// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use std::path::PathBuf;
use upi_scanner::Config;
use upi_scanner::backends::camera::CameraBackendType;
use upi_scanner::config::{CameraPermission, RouterPolicy};
use upi_scanner::errors::AppError;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.router_policy, RouterPolicy::Dispatch);
    assert_eq!(config.scheme_prefix, "upi://");
    assert_eq!(config.backend, CameraBackendType::Still);
    assert_eq!(config.camera_permission, CameraPermission::Prompt);
    assert_eq!(config.default_camera, None);
    assert!(
        config.repeat_suppression().is_some(),
        "Repeat suppression should be enabled by default"
    );
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        router_policy: RouterPolicy::Display,
        still_sources: vec![PathBuf::from("/tmp/qr.png")],
        default_camera: Some("1".to_string()),
        camera_permission: CameraPermission::Granted,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "router_policy": "display", "still_fps": 2 }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.router_policy, RouterPolicy::Display);
    assert_eq!(config.still_fps, 2);
    assert_eq!(config.scheme_prefix, "upi://");
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "router_policy": "toast" }"#).unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
}
