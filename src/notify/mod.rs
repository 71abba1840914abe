//! Outbound motion reports.
//!
//! Delivery is a collaborator of the capture loop, isolated behind the
//! [`Notifier`] trait. Failures are recovered by the caller: a report
//! that cannot be delivered is logged and dropped, and still counts as
//! emitted for throttling purposes — there is no retry of a missed event.

mod http;

pub use http::HttpNotifier;

use crate::capture::Frame;
use thiserror::Error;

/// Errors that can occur while delivering a motion report.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
    #[error("snapshot buffer does not match frame dimensions")]
    InvalidFrame,
    #[error("request failed: {0}")]
    Request(#[from] Box<ureq::Error>),
}

/// Trait for motion report delivery.
pub trait Notifier: Send + Sync {
    /// Delivers a report carrying the frame snapshot and node identifier.
    fn notify(&self, frame: &Frame, node: &str) -> Result<(), NotifyError>;
}

/// Notifier used when no destination is configured.
///
/// Accepts every report and does nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _frame: &Frame, _node: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Returns the default node identifier: the host name, with a fixed
/// fallback when the environment does not provide one.
pub fn default_node_id() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-node".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_accepts_everything() {
        let frame = Frame::new(vec![0u8; 64], 8, 8, 1);
        assert!(NoopNotifier.notify(&frame, "node-a").is_ok());
    }

    #[test]
    fn test_default_node_id_nonempty() {
        assert!(!default_node_id().is_empty());
    }
}
