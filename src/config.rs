//! Daemon configuration.
//!
//! All tuning knobs live in one TOML file, loaded once at startup.
//! Loading is fail-fast: the capture loop can never be started with an
//! incomplete or malformed configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// Seconds to wait after opening the device before the first frame counts.
    pub warmup_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 16,
            warmup_secs: 2.5,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the capture parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if !self.warmup_secs.is_finite() || self.warmup_secs < 0.0 {
            return Err(ConfigError::InvalidWarmup);
        }
        Ok(())
    }
}

/// Configuration for the per-frame motion detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Gaussian blur kernel size in pixels (odd, at least 3).
    pub blur_kernel: u32,
    /// Minimum per-pixel delta counted as foreground (inclusive).
    pub delta_thresh: u8,
    /// Dilation distance applied to the thresholded delta.
    pub dilate_distance: u8,
    /// Minimum connected-component area (pixels) for a qualifying region.
    pub min_area: u32,
    /// Background accumulation weight for the current frame.
    pub alpha: f32,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 21,
            delta_thresh: 5,
            dilate_distance: 2,
            min_area: 5000,
            alpha: 0.5,
        }
    }
}

impl DetectConfig {
    /// Validates the detector parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_kernel < 3 || self.blur_kernel % 2 == 0 {
            return Err(ConfigError::InvalidBlurKernel);
        }
        if self.delta_thresh == 0 {
            return Err(ConfigError::InvalidDeltaThreshold);
        }
        if self.dilate_distance == 0 {
            return Err(ConfigError::InvalidDilateDistance);
        }
        if self.min_area == 0 {
            return Err(ConfigError::InvalidMinArea);
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha > 1.0 {
            return Err(ConfigError::InvalidAlpha);
        }
        Ok(())
    }
}

/// Configuration for event debouncing and report throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Consecutive qualifying frames required before a report is emitted.
    pub min_motion_frames: u32,
    /// Minimum seconds between two reports. Fractional values are honored.
    pub min_upload_interval_secs: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            min_motion_frames: 8,
            min_upload_interval_secs: 3.0,
        }
    }
}

impl EventConfig {
    /// Validates the event parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_motion_frames == 0 {
            return Err(ConfigError::InvalidMotionFrames);
        }
        if !self.min_upload_interval_secs.is_finite() || self.min_upload_interval_secs < 0.0 {
            return Err(ConfigError::InvalidUploadInterval);
        }
        Ok(())
    }
}

/// Configuration for outbound motion reports.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotifyConfig {
    /// Report destination URL. Empty disables notification entirely.
    pub endpoint: String,
    /// Node identifier attached to each report. Defaults to the host name.
    pub node: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl NotifyConfig {
    /// Validates the notification parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.is_empty()
            && !self.endpoint.starts_with("http://")
            && !self.endpoint.starts_with("https://")
        {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }
        Ok(())
    }

    /// Returns true if notification is disabled.
    pub fn is_disabled(&self) -> bool {
        self.endpoint.is_empty()
    }
}

/// Configuration for the HTTP control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Port the control server binds to.
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Camera capture settings.
    pub capture: CaptureConfig,
    /// Motion detector settings.
    pub detect: DetectConfig,
    /// Debounce and throttle settings.
    pub events: EventConfig,
    /// Outbound report settings.
    pub notify: NotifyConfig,
    /// Control server settings.
    pub control: ControlConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.detect.validate()?;
        self.events.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("invalid camera warmup time")]
    InvalidWarmup,
    #[error("invalid blur kernel (must be odd and at least 3)")]
    InvalidBlurKernel,
    #[error("invalid delta threshold (must be at least 1)")]
    InvalidDeltaThreshold,
    #[error("invalid dilate distance (must be at least 1)")]
    InvalidDilateDistance,
    #[error("invalid minimum region area (must be at least 1)")]
    InvalidMinArea,
    #[error("invalid background alpha (must be in (0, 1])")]
    InvalidAlpha,
    #[error("invalid minimum motion frames (must be at least 1)")]
    InvalidMotionFrames,
    #[error("invalid minimum upload interval")]
    InvalidUploadInterval,
    #[error("invalid notification endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
