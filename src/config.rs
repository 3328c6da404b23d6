// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraBackendType;
use crate::constants::{decoding, scheme, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "upi-scanner";

/// File name of the JSON configuration
const CONFIG_FILE_NAME: &str = "config.json";

/// What to do with a decoded payload
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterPolicy {
    /// Act only on payloads with the configured scheme and launch a handler for them
    #[default]
    Dispatch,
    /// Show every non-empty payload in a modal dialog
    Display,
}

impl std::fmt::Display for RouterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterPolicy::Dispatch => write!(f, "dispatch"),
            RouterPolicy::Display => write!(f, "display"),
        }
    }
}

impl std::str::FromStr for RouterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dispatch" => Ok(RouterPolicy::Dispatch),
            "display" => Ok(RouterPolicy::Display),
            other => Err(format!(
                "unknown router policy '{}' (expected 'dispatch' or 'display')",
                other
            )),
        }
    }
}

/// How the camera permission request is answered
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPermission {
    /// Ask interactively on the terminal
    #[default]
    Prompt,
    /// Treat the permission as already granted
    Granted,
    /// Treat every request as refused
    Denied,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Result routing policy (dispatch or display)
    pub router_policy: RouterPolicy,
    /// Scheme prefix a payload must start with under the dispatch policy
    pub scheme_prefix: String,
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Image files served as cameras by the still backend
    pub still_sources: Vec<PathBuf>,
    /// Frame rate of the still backend
    pub still_fps: u32,
    /// Frames are downscaled so neither side exceeds this before decoding
    pub max_decode_dimension: u32,
    /// Identical payloads are not acted on again within this window (0 disables)
    pub repeat_suppression_ms: u64,
    /// Camera permission answer
    pub camera_permission: CameraPermission,
    /// Camera identifier to select first, if it is enumerated
    pub default_camera: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router_policy: RouterPolicy::default(),
            scheme_prefix: scheme::UPI_PREFIX.to_string(),
            backend: CameraBackendType::default(),
            still_sources: Vec::new(),
            still_fps: timing::DEFAULT_STILL_FPS,
            max_decode_dimension: decoding::DEFAULT_MAX_DIMENSION,
            repeat_suppression_ms: timing::DEFAULT_REPEAT_SUPPRESSION_MS,
            camera_permission: CameraPermission::default(),
            default_camera: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// parsed is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), policy = %config.router_policy, "Loaded configuration");
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Repeat-suppression window, `None` when disabled
    pub fn repeat_suppression(&self) -> Option<Duration> {
        (self.repeat_suppression_ms > 0).then(|| Duration::from_millis(self.repeat_suppression_ms))
    }

    /// Still backend frame interval (at least 1 fps)
    pub fn still_frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.still_fps.max(1)
    }
}
