//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use super::Frame;
use crate::config::CaptureConfig;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame. Blocks until the device has one ready.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera that renders a synthetic scene.
///
/// The scene is a flat gray background with an optional bright square
/// drifting horizontally, which the detection pipeline picks up as a
/// coherent moving region.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    moving_target: bool,
    paced: bool,
}

/// Background luminance of the synthetic scene.
const SCENE_BACKGROUND: u8 = 60;
/// Luminance of the drifting target.
const TARGET_VALUE: u8 = 220;
/// Edge length of the drifting target in pixels.
const TARGET_SIZE: u32 = 48;

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the drifting bright square.
    pub fn with_moving_target(mut self) -> Self {
        self.moving_target = true;
        self
    }

    /// Paces `capture` to the configured frame rate instead of
    /// returning immediately.
    pub fn with_pacing(mut self) -> Self {
        self.paced = true;
        self
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(width = config.width, height = config.height, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        if self.paced {
            std::thread::sleep(Duration::from_millis(1000 / u64::from(config.fps)));
        }

        let (width, height) = (config.width, config.height);
        let mut pixels = vec![SCENE_BACKGROUND; (width * height) as usize];

        if self.moving_target && width > TARGET_SIZE && height > TARGET_SIZE {
            let x0 = (self.sequence * 4) % u64::from(width - TARGET_SIZE);
            let y0 = (height - TARGET_SIZE) / 2;
            for y in y0..y0 + TARGET_SIZE {
                for x in x0 as u32..x0 as u32 + TARGET_SIZE {
                    pixels[(y * width + x) as usize] = TARGET_VALUE;
                }
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}
