// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that do not need the interactive screen
//!
//! - Listing available cameras
//! - Decoding a single image file

use std::path::Path;
use upi_scanner::app::backend_options;
use upi_scanner::app::frame_processor::{QrDetector, ResultRouter, RouteAction};
use upi_scanner::app::menu::CameraMenu;
use upi_scanner::backends::camera::CameraBackendManager;
use upi_scanner::backends::camera::still::load_image_as_frame;
use upi_scanner::config::Config;
use upi_scanner::errors::AppResult;

/// List all available cameras
pub fn list_cameras(config: &Config) -> AppResult<()> {
    let manager = CameraBackendManager::for_type(config.backend, &backend_options(config))?;
    let cameras = manager.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({} backend):", manager.backend_type());
    println!();
    for camera in &cameras {
        match camera.camera_id() {
            Some(id) => println!("  {}  {}", CameraMenu::label_for(id), camera.name),
            None => println!("  (not selectable)  {}", camera.name),
        }
        if camera.rotation.degrees() != 0 {
            println!("      Rotation: {}", camera.rotation);
        }
    }

    Ok(())
}

/// Decode every QR code in an image and show what the scanner would do with it
pub fn decode_image(config: &Config, path: &Path) -> AppResult<()> {
    let frame = load_image_as_frame(path)?;
    let detector = QrDetector::with_max_dimension(config.max_decode_dimension);
    let payloads = detector.decode_blocking(&frame)?;

    if payloads.is_empty() {
        println!("No QR code found in {}", path.display());
        return Ok(());
    }

    for payload in &payloads {
        println!("{}", payload.content);
    }

    let router = ResultRouter::new(config.router_policy, config.scheme_prefix.clone());
    match router.route(&payloads) {
        Some(RouteAction::Dispatch { uri }) => println!("\nWould open: {}", uri),
        Some(RouteAction::Display { text }) => println!("\nWould show: {}", text),
        None => println!("\nNo payload matches the {} policy", router.policy()),
    }

    Ok(())
}
