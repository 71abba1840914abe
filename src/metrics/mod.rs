//! Prometheus metrics for the detection pipeline.
//!
//! Exposed in text format by the control server's `/metrics` route.
//!
//! Metrics:
//! - `motion_sentry_frames_total` - frames processed by the capture loop
//! - `motion_sentry_motion_frames_total` - frames with a qualifying region
//! - `motion_sentry_reports_total` - sustained-motion reports emitted
//! - `motion_sentry_report_failures_total` - reports that failed delivery
//! - `motion_sentry_run_state` - control state (1=running, 0=stopped)

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Metrics registry for the capture loop and control surface.
pub struct PipelineMetrics {
    registry: Registry,

    frames_total: IntCounter,
    motion_frames_total: IntCounter,
    reports_total: IntCounter,
    report_failures_total: IntCounter,
    run_state: IntGauge,
}

impl PipelineMetrics {
    /// Creates a registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_total = IntCounter::new(
            "motion_sentry_frames_total",
            "Frames processed by the capture loop",
        )?;
        let motion_frames_total = IntCounter::new(
            "motion_sentry_motion_frames_total",
            "Frames containing at least one qualifying motion region",
        )?;
        let reports_total = IntCounter::new(
            "motion_sentry_reports_total",
            "Sustained-motion reports emitted",
        )?;
        let report_failures_total = IntCounter::new(
            "motion_sentry_report_failures_total",
            "Motion reports that failed delivery",
        )?;
        let run_state = IntGauge::new(
            "motion_sentry_run_state",
            "Control state (1=running, 0=stopped)",
        )?;

        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(motion_frames_total.clone()))?;
        registry.register(Box::new(reports_total.clone()))?;
        registry.register(Box::new(report_failures_total.clone()))?;
        registry.register(Box::new(run_state.clone()))?;

        Ok(Self {
            registry,
            frames_total,
            motion_frames_total,
            reports_total,
            report_failures_total,
            run_state,
        })
    }

    /// Records one processed frame.
    pub fn record_frame(&self) {
        self.frames_total.inc();
    }

    /// Records one frame with qualifying motion.
    pub fn record_motion(&self) {
        self.motion_frames_total.inc();
    }

    /// Records one emitted report.
    pub fn record_report(&self) {
        self.reports_total.inc();
    }

    /// Records one failed report delivery.
    pub fn record_report_failure(&self) {
        self.report_failures_total.inc();
    }

    /// Sets the run-state gauge.
    pub fn set_running(&self, running: bool) {
        self.run_state.set(if running { 1 } else { 0 });
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        assert!(PipelineMetrics::new().is_ok());
    }

    #[test]
    fn test_recorded_values_encoded() {
        let metrics = PipelineMetrics::new().unwrap();

        metrics.record_frame();
        metrics.record_frame();
        metrics.record_motion();
        metrics.record_report();
        metrics.set_running(true);

        let output = metrics.encode().unwrap();
        assert!(output.contains("motion_sentry_frames_total 2"));
        assert!(output.contains("motion_sentry_motion_frames_total 1"));
        assert!(output.contains("motion_sentry_reports_total 1"));
        assert!(output.contains("motion_sentry_run_state 1"));
    }

    #[test]
    fn test_encode_lists_all_metrics() {
        let metrics = PipelineMetrics::new().unwrap();
        let output = metrics.encode().unwrap();

        assert!(output.contains("motion_sentry_frames_total"));
        assert!(output.contains("motion_sentry_report_failures_total"));
        assert!(output.contains("motion_sentry_run_state"));
    }
}
