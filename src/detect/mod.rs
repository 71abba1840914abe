//! Motion detection pipeline.
//!
//! Per-frame flow: Gaussian blur, background model delta, foreground
//! region extraction, then debounce/throttle. The pipeline owns all of
//! its state; it is private to the capture loop and never shared.

mod background;
mod debounce;
mod regions;

pub use background::BackgroundModel;
pub use debounce::{Decision, EventDebouncer};
pub use regions::{MotionExtractor, Region};

use crate::capture::Frame;
use crate::config::{DetectConfig, EventConfig};
use imageproc::filter::gaussian_blur_f32;
use std::time::{Duration, Instant};

/// Qualifying regions behind an emitted motion report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Regions whose area met the configured minimum this frame.
    pub regions: Vec<Region>,
}

impl Detection {
    /// Returns the area of the largest qualifying region.
    pub fn largest_area(&self) -> u32 {
        self.regions.iter().map(|r| r.area).max().unwrap_or(0)
    }
}

/// Verdict for a single processed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionOutcome {
    /// First frame of the run; the background model was initialized.
    Calibrating,
    /// No qualifying region this frame.
    Still,
    /// Qualifying motion seen, but below the report criteria.
    Observed,
    /// Sustained motion that should be reported.
    Sustained(Detection),
}

/// Stateful per-frame motion detector for one capture run.
pub struct MotionPipeline {
    background: Option<BackgroundModel>,
    extractor: MotionExtractor,
    debouncer: EventDebouncer,
    blur_sigma: f32,
    alpha: f32,
}

impl MotionPipeline {
    /// Builds a pipeline from validated configuration.
    pub fn new(detect: &DetectConfig, events: &EventConfig) -> Self {
        // OpenCV's default kernel-to-sigma mapping.
        let blur_sigma = 0.3 * ((detect.blur_kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8;
        Self {
            background: None,
            extractor: MotionExtractor::new(
                detect.delta_thresh,
                detect.dilate_distance,
                detect.min_area,
            ),
            debouncer: EventDebouncer::new(
                events.min_motion_frames,
                Duration::from_secs_f64(events.min_upload_interval_secs),
            ),
            blur_sigma,
            alpha: detect.alpha,
        }
    }

    /// Runs one frame through the pipeline.
    ///
    /// `now` is the frame's capture time; it drives the throttle window.
    pub fn process(&mut self, frame: &Frame, now: Instant) -> MotionOutcome {
        debug_assert!(frame.is_valid());
        let gray = match frame.to_gray() {
            Some(gray) => gray,
            None => return MotionOutcome::Still,
        };
        let blurred = gaussian_blur_f32(&gray, self.blur_sigma);

        let background = match self.background.as_mut() {
            Some(background) => background,
            None => {
                self.background = Some(BackgroundModel::new(&blurred, self.alpha));
                tracing::info!("background model initialized");
                return MotionOutcome::Calibrating;
            }
        };

        if blurred.dimensions() != background.dimensions() {
            tracing::warn!(
                sequence = frame.sequence(),
                "frame dimensions changed mid-run, skipping"
            );
            return MotionOutcome::Still;
        }

        let delta = background.update(&blurred);
        let regions = self.extractor.extract(&delta);

        if regions.is_empty() {
            self.debouncer.observe(false, now);
            return MotionOutcome::Still;
        }

        match self.debouncer.observe(true, now) {
            Decision::Emit => MotionOutcome::Sustained(Detection { regions }),
            Decision::Hold => MotionOutcome::Observed,
        }
    }

    /// Returns the current consecutive-motion streak.
    pub fn motion_streak(&self) -> u32 {
        self.debouncer.streak()
    }
}
