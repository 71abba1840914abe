//! Real capture device backed by nokhwa.
//!
//! Only compiled with the `camera` feature. The device negotiates the
//! closest available format to the configured resolution and frame rate
//! and decodes every frame to grayscale.

use super::{Camera, CameraError, Frame};
use crate::config::CaptureConfig;
use nokhwa::{
    pixel_format::LumaFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};

/// Camera implementation for physical capture devices.
pub struct DeviceCamera {
    inner: Option<nokhwa::Camera>,
    sequence: u64,
}

impl DeviceCamera {
    /// Creates an unopened device camera.
    pub fn new() -> Self {
        Self {
            inner: None,
            sequence: 0,
        }
    }
}

impl Default for DeviceCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for DeviceCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let requested = RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                config.fps,
            ),
        ));

        let mut camera = nokhwa::Camera::new(CameraIndex::Index(config.device_id), requested)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        tracing::info!(
            device = config.device_id,
            format = %camera.camera_format(),
            "capture device opened"
        );

        self.inner = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let camera = self.inner.as_mut().ok_or(CameraError::NotInitialized)?;

        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<LumaFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.inner.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "failed to stop camera stream");
            }
            tracing::info!("capture device closed");
        }
    }
}
