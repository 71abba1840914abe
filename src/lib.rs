//! Motion Sentry Library
//!
//! Camera motion detection against a running background model, with
//! sustained detections reported to a remote endpoint and the capture
//! loop governed by a start/stop control surface.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → detect (background / regions / debounce) → notify
//!     ↑
//! control (start/stop state machine + HTTP surface)
//! ```
//!
//! # Design Principles
//!
//! - **One loop per run**: starting an already-running controller is a
//!   no-op; each run owns its camera and its liveness flag
//! - **Noise-tolerant**: a time throttle plus a consecutive-frame
//!   debounce turn raw per-frame flicker into a low-rate event stream
//! - **Non-fatal delivery**: a failed report is logged and dropped; the
//!   pipeline never stalls permanently on the notifier
//!
//! # Example
//!
//! ```no_run
//! use motion_sentry::{
//!     capture::{Camera, MockCamera},
//!     config::FileConfig,
//!     detect::{MotionOutcome, MotionPipeline},
//! };
//!
//! let config = FileConfig::default();
//! let mut camera = MockCamera::new().with_moving_target();
//! camera.open(&config.capture).unwrap();
//!
//! let mut pipeline = MotionPipeline::new(&config.detect, &config.events);
//!
//! for _ in 0..10 {
//!     let frame = camera.capture().unwrap();
//!     if let MotionOutcome::Sustained(detection) = pipeline.process(&frame, frame.timestamp()) {
//!         println!("motion over {} pixels", detection.largest_area());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod control;
pub mod detect;
pub mod metrics;
pub mod notify;

// Re-export commonly used types at crate root
pub use capture::{Camera, CameraError, Frame, MockCamera};
pub use config::{ConfigError, FileConfig};
pub use control::{ControlServer, ControlServerConfig, RunController, RunState, StartOutcome};
pub use detect::{Detection, EventDebouncer, MotionOutcome, MotionPipeline, Region};
pub use metrics::PipelineMetrics;
pub use notify::{HttpNotifier, NoopNotifier, Notifier};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
