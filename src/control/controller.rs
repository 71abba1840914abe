//! Start/stop state machine for the capture loop.

use super::worker::CaptureWorker;
use crate::capture::Camera;
use crate::config::FileConfig;
use crate::metrics::PipelineMetrics;
use crate::notify::{default_node_id, Notifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Control state of the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No capture loop is active.
    Stopped,
    /// A capture loop is active (or winding down after `stop`).
    Running,
}

impl RunState {
    /// Returns the wire representation: 0 for Stopped, 1 for Running.
    pub fn as_code(self) -> u8 {
        match self {
            RunState::Stopped => 0,
            RunState::Running => 1,
        }
    }
}

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new capture loop was spawned.
    Started,
    /// A capture loop was already active; nothing was spawned.
    AlreadyRunning,
    /// The worker thread could not be spawned.
    Failed,
}

/// Factory producing a fresh camera for each capture run.
pub type CameraFactory = Box<dyn Fn() -> Box<dyn Camera + Send> + Send + Sync>;

/// Concurrency-safe owner of the capture loop lifetime.
///
/// Each run gets its own liveness flag: the flag a worker polls belongs
/// to that worker alone, so a loop still draining from a previous run
/// can never be revived by a quick stop/start cycle. The flag swap in
/// `start` happens under one lock, making check-then-spawn race-free.
pub struct RunController {
    active: Mutex<Arc<AtomicBool>>,
    config: FileConfig,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<PipelineMetrics>,
    camera_factory: CameraFactory,
    node: String,
}

impl RunController {
    /// Creates a controller in the Stopped state.
    pub fn new(
        config: FileConfig,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<PipelineMetrics>,
        camera_factory: CameraFactory,
    ) -> Self {
        let node = config
            .notify
            .node
            .clone()
            .unwrap_or_else(default_node_id);
        Self {
            active: Mutex::new(Arc::new(AtomicBool::new(false))),
            config,
            notifier,
            metrics,
            camera_factory,
            node,
        }
    }

    /// Starts the capture loop if it is not already running.
    ///
    /// Returns immediately; warm-up and capture happen on the worker
    /// thread. Two concurrent calls spawn at most one loop.
    pub fn start(&self) -> StartOutcome {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.load(Ordering::Acquire) {
            tracing::info!("start requested but capture loop already running");
            return StartOutcome::AlreadyRunning;
        }

        let alive = Arc::new(AtomicBool::new(true));
        let worker = CaptureWorker {
            camera: (self.camera_factory)(),
            capture: self.config.capture.clone(),
            detect: self.config.detect.clone(),
            events: self.config.events.clone(),
            node: self.node.clone(),
            notifier: Arc::clone(&self.notifier),
            metrics: Arc::clone(&self.metrics),
            alive: Arc::clone(&alive),
        };

        match std::thread::Builder::new()
            .name("capture-loop".into())
            .spawn(move || worker.run())
        {
            Ok(_) => {
                *active = alive;
                self.metrics.set_running(true);
                tracing::info!("capture loop started");
                StartOutcome::Started
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn capture loop");
                StartOutcome::Failed
            }
        }
    }

    /// Stops the capture loop.
    ///
    /// Idempotent and fire-and-forget: the caller is acknowledged before
    /// the loop has necessarily exited. The loop observes the cleared
    /// flag at the top of its next iteration.
    pub fn stop(&self) -> RunState {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.swap(false, Ordering::AcqRel) {
            tracing::info!("capture loop stop requested");
        }
        self.metrics.set_running(false);
        RunState::Stopped
    }

    /// Returns the current control state. Never blocks on the loop.
    pub fn state(&self) -> RunState {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("state", &self.state())
            .field("node", &self.node)
            .finish()
    }
}
