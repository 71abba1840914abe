//! Capture loop body.
//!
//! One worker instance corresponds to one run: it opens the device,
//! warms it up, then processes frames until its liveness flag clears or
//! the device fails. Device release and flag clearing are guaranteed on
//! every exit path.

use crate::capture::Camera;
use crate::config::{CaptureConfig, DetectConfig, EventConfig};
use crate::detect::{MotionOutcome, MotionPipeline};
use crate::metrics::PipelineMetrics;
use crate::notify::Notifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// State handed to one capture run.
pub(crate) struct CaptureWorker {
    pub(crate) camera: Box<dyn Camera + Send>,
    pub(crate) capture: CaptureConfig,
    pub(crate) detect: DetectConfig,
    pub(crate) events: EventConfig,
    pub(crate) node: String,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) alive: Arc<AtomicBool>,
}

/// Clears the run's liveness flag when the worker exits, whatever the
/// exit path was.
struct LivenessGuard {
    alive: Arc<AtomicBool>,
    metrics: Arc<PipelineMetrics>,
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.metrics.set_running(false);
    }
}

impl CaptureWorker {
    /// Runs the capture loop to completion.
    pub(crate) fn run(mut self) {
        let _guard = LivenessGuard {
            alive: Arc::clone(&self.alive),
            metrics: Arc::clone(&self.metrics),
        };

        if let Err(e) = self.camera.open(&self.capture) {
            tracing::error!(error = %e, "failed to open capture device");
            return;
        }

        tracing::info!(secs = self.capture.warmup_secs, "warming up camera");
        std::thread::sleep(Duration::from_secs_f64(self.capture.warmup_secs));

        let mut pipeline = MotionPipeline::new(&self.detect, &self.events);

        while self.alive.load(Ordering::Acquire) {
            let frame = match self.camera.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "frame capture failed, terminating run");
                    break;
                }
            };
            if !frame.is_valid() {
                tracing::warn!(sequence = frame.sequence(), "discarding malformed frame");
                continue;
            }

            self.metrics.record_frame();
            match pipeline.process(&frame, frame.timestamp()) {
                MotionOutcome::Calibrating | MotionOutcome::Still => {}
                MotionOutcome::Observed => {
                    self.metrics.record_motion();
                    tracing::trace!(
                        sequence = frame.sequence(),
                        streak = pipeline.motion_streak(),
                        "motion observed"
                    );
                }
                MotionOutcome::Sustained(detection) => {
                    self.metrics.record_motion();
                    self.metrics.record_report();
                    tracing::info!(
                        sequence = frame.sequence(),
                        regions = detection.regions.len(),
                        largest_area = detection.largest_area(),
                        "sustained motion detected"
                    );
                    if let Err(e) = self.notifier.notify(&frame, &self.node) {
                        self.metrics.record_report_failure();
                        tracing::warn!(error = %e, "motion report failed");
                    }
                }
            }
        }

        self.camera.close();
        tracing::info!("capture loop exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CameraError, Frame};
    use crate::notify::NotifyError;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    const SIDE: u32 = 100;

    struct ScriptedCamera {
        frames: VecDeque<Vec<u8>>,
        closed: Arc<AtomicBool>,
        sequence: u64,
    }

    impl Camera for ScriptedCamera {
        fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
            Ok(())
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            match self.frames.pop_front() {
                Some(pixels) => {
                    self.sequence += 1;
                    Ok(Frame::new(pixels, SIDE, SIDE, self.sequence))
                }
                None => Err(CameraError::CaptureFailed("script exhausted".into())),
            }
        }

        fn is_open(&self) -> bool {
            true
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct RecordingNotifier {
        deliveries: AtomicUsize,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _frame: &Frame, _node: &str) -> Result<(), NotifyError> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotifyError::InvalidFrame);
            }
            Ok(())
        }
    }

    fn quiet() -> Vec<u8> {
        vec![0u8; (SIDE * SIDE) as usize]
    }

    fn moving() -> Vec<u8> {
        let mut pixels = quiet();
        for y in 30..70 {
            for x in 30..70 {
                pixels[(y * SIDE + x) as usize] = 200;
            }
        }
        pixels
    }

    fn worker_for(
        frames: Vec<Vec<u8>>,
        notifier: Arc<dyn Notifier>,
        closed: Arc<AtomicBool>,
        alive: Arc<AtomicBool>,
    ) -> CaptureWorker {
        CaptureWorker {
            camera: Box::new(ScriptedCamera {
                frames: frames.into(),
                closed,
                sequence: 0,
            }),
            capture: CaptureConfig {
                warmup_secs: 0.0,
                ..CaptureConfig::with_dimensions(SIDE, SIDE)
            },
            detect: DetectConfig {
                blur_kernel: 5,
                delta_thresh: 10,
                dilate_distance: 2,
                min_area: 500,
                alpha: 0.5,
            },
            events: EventConfig {
                min_motion_frames: 3,
                min_upload_interval_secs: 0.0,
            },
            node: "test-node".into(),
            notifier,
            metrics: Arc::new(PipelineMetrics::new().unwrap()),
            alive,
        }
    }

    #[test]
    fn test_sustained_motion_is_reported_once() {
        let notifier = Arc::new(RecordingNotifier {
            deliveries: AtomicUsize::new(0),
            fail: false,
        });
        let closed = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        // Calibration frame, then three consecutive motion frames.
        let frames = vec![quiet(), moving(), moving(), moving()];
        worker_for(frames, Arc::clone(&notifier) as Arc<dyn Notifier>, Arc::clone(&closed), Arc::clone(&alive))
            .run();

        assert_eq!(notifier.deliveries.load(Ordering::SeqCst), 1);
        // Script exhaustion ends the run: device released, flag cleared.
        assert!(closed.load(Ordering::SeqCst));
        assert!(!alive.load(Ordering::SeqCst));
    }

    #[test]
    fn test_quiet_scene_never_reports() {
        let notifier = Arc::new(RecordingNotifier {
            deliveries: AtomicUsize::new(0),
            fail: false,
        });
        let closed = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let frames = vec![quiet(); 10];
        worker_for(frames, Arc::clone(&notifier) as Arc<dyn Notifier>, Arc::clone(&closed), Arc::clone(&alive))
            .run();

        assert_eq!(notifier.deliveries.load(Ordering::SeqCst), 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_notify_failure_does_not_kill_the_loop() {
        let notifier = Arc::new(RecordingNotifier {
            deliveries: AtomicUsize::new(0),
            fail: true,
        });
        let closed = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        // Two quiet frames after the report prove the loop kept going.
        let frames = vec![quiet(), moving(), moving(), moving(), quiet(), quiet()];
        let worker = worker_for(
            frames,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&closed),
            Arc::clone(&alive),
        );
        let metrics = Arc::clone(&worker.metrics);
        worker.run();

        assert_eq!(notifier.deliveries.load(Ordering::SeqCst), 1);
        assert!(closed.load(Ordering::SeqCst));
        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("motion_sentry_frames_total 6"));
        assert!(encoded.contains("motion_sentry_report_failures_total 1"));
    }

    #[test]
    fn test_cleared_flag_stops_before_first_capture() {
        let notifier = Arc::new(RecordingNotifier {
            deliveries: AtomicUsize::new(0),
            fail: false,
        });
        let closed = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(false));

        let frames = vec![moving(); 5];
        let worker = worker_for(
            frames,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&closed),
            Arc::clone(&alive),
        );
        let metrics = Arc::clone(&worker.metrics);
        worker.run();

        assert_eq!(notifier.deliveries.load(Ordering::SeqCst), 0);
        assert!(closed.load(Ordering::SeqCst));
        assert!(metrics.encode().unwrap().contains("motion_sentry_frames_total 0"));
    }
}
