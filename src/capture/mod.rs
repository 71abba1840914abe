//! Camera input and frame handling.
//!
//! This module provides abstractions for capturing frames from a camera
//! device. The camera is treated as a lazy, infinite, non-restartable
//! source of grayscale frames; one run of the capture loop owns exactly
//! one open device.

mod camera;
#[cfg(feature = "camera")]
mod device;
mod frame;

pub use camera::{Camera, CameraError, MockCamera};
#[cfg(feature = "camera")]
pub use device::DeviceCamera;
pub use frame::Frame;
