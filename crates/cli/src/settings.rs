use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use facegate_core::camera::infrastructure::ffmpeg_camera::{default_device, default_input_format};
use facegate_core::recognition::overlay::SourceOrientation;
use facegate_core::shared::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CADENCE_MS, DEFAULT_REQUEST_TIMEOUT_MS, ENROLLMENT_JPEG_QUALITY,
    ENROLLMENT_RESOLUTION, LIVE_JPEG_QUALITY, LIVE_RESOLUTION,
};
use facegate_core::shared::frame::Resolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub cadence_ms: u64,
    pub request_timeout_ms: u64,
    pub camera_device: String,
    pub camera_format: Option<String>,
    pub live_resolution: String,
    pub enrollment_resolution: String,
    pub live_jpeg_quality: u8,
    pub enrollment_jpeg_quality: u8,
    /// Set when the recognizer already sees a flipped image.
    pub recognizer_mirrored: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cadence_ms: DEFAULT_CADENCE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            camera_device: default_device().to_string(),
            camera_format: default_input_format().map(str::to_string),
            live_resolution: LIVE_RESOLUTION.to_string(),
            enrollment_resolution: ENROLLMENT_RESOLUTION.to_string(),
            live_jpeg_quality: LIVE_JPEG_QUALITY,
            enrollment_jpeg_quality: ENROLLMENT_JPEG_QUALITY,
            recognizer_mirrored: false,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Facegate").join("settings.json"))
    }

    /// Reads the user's settings file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn live_resolution(&self) -> Resolution {
        Resolution::parse(&self.live_resolution).unwrap_or(LIVE_RESOLUTION)
    }

    pub fn enrollment_resolution(&self) -> Resolution {
        Resolution::parse(&self.enrollment_resolution).unwrap_or(ENROLLMENT_RESOLUTION)
    }

    pub fn source_orientation(&self) -> SourceOrientation {
        if self.recognizer_mirrored {
            SourceOrientation::Mirrored
        } else {
            SourceOrientation::Unmirrored
        }
    }
}
