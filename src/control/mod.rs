//! Run-state control and the HTTP control surface.
//!
//! [`RunController`] owns the capture loop's lifetime: `start` spawns the
//! loop as a background thread, `stop` asks it to wind down, and the loop
//! itself only ever communicates back through its liveness flag. The
//! [`ControlServer`] exposes that state machine over HTTP.

mod controller;
mod server;
mod worker;

pub use controller::{CameraFactory, RunController, RunState, StartOutcome};
pub use server::{ControlServer, ControlServerConfig, ServerError};
