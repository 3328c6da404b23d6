// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use upi_scanner::backends::camera::CameraBackendType;
use upi_scanner::config::{CameraPermission, Config, RouterPolicy};
use upi_scanner::constants::app_info;
use upi_scanner::errors::AppResult;

mod cli;

#[derive(Parser)]
#[command(name = "upi-scanner")]
#[command(about = "Scan QR codes and hand UPI payment links to a payment app")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: <config dir>/upi-scanner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// What to do with decoded codes: dispatch or display
    #[arg(long, global = true)]
    policy: Option<RouterPolicy>,

    /// Camera backend: still or gstreamer
    #[arg(long, global = true)]
    backend: Option<CameraBackendType>,

    /// Image file served as a camera by the still backend (repeatable)
    #[arg(long = "source", global = true)]
    sources: Vec<PathBuf>,

    /// Camera to select first (menu label or identifier)
    #[arg(long)]
    camera: Option<String>,

    /// Grant camera access without asking
    #[arg(long, conflicts_with = "deny_camera")]
    grant_camera: bool,

    /// Refuse camera access without asking
    #[arg(long)]
    deny_camera: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Decode the QR codes in an image file
    Decode {
        /// Image to decode
        image: PathBuf,
    },
}

impl Cli {
    /// Load the configuration and layer command-line overrides on top
    fn config(&self) -> AppResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(policy) = self.policy {
            config.router_policy = policy;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if !self.sources.is_empty() {
            config.still_sources = self.sources.clone();
        }
        if let Some(camera) = &self.camera {
            config.default_camera = Some(camera.clone());
        }
        if self.grant_camera {
            config.camera_permission = CameraPermission::Granted;
        } else if self.deny_camera {
            config.camera_permission = CameraPermission::Denied;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=upi_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    match &cli.command {
        Some(Commands::List) => cli::list_cameras(&config)?,
        Some(Commands::Decode { image }) => cli::decode_image(&config, image)?,
        None => upi_scanner::app::run(config)?,
    }

    Ok(())
}
