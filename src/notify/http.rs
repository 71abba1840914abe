//! HTTP delivery of motion reports.
//!
//! Encodes the triggering frame as JPEG and issues a blocking PUT to the
//! configured endpoint. The call runs on the capture thread; a slow
//! destination stalls frame processing, which is an accepted limitation
//! of the synchronous design.

use super::{Notifier, NotifyError};
use crate::capture::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::time::Duration;

/// JPEG quality used for report snapshots.
const SNAPSHOT_QUALITY: u8 = 80;

/// Notifier that PUTs JPEG snapshots to an HTTP endpoint.
pub struct HttpNotifier {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpNotifier {
    /// Creates a notifier for the given endpoint with a bounded timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { endpoint, agent }
    }

    fn encode_snapshot(frame: &Frame) -> Result<Vec<u8>, NotifyError> {
        if !frame.is_valid() {
            return Err(NotifyError::InvalidFrame);
        }
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, SNAPSHOT_QUALITY);
        encoder.encode(
            frame.pixels(),
            frame.width(),
            frame.height(),
            ExtendedColorType::L8,
        )?;
        Ok(buffer)
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, frame: &Frame, node: &str) -> Result<(), NotifyError> {
        let snapshot = Self::encode_snapshot(frame)?;

        let response = self
            .agent
            .put(&self.endpoint)
            .query("node", node)
            .set("Content-Type", "image/jpeg")
            .set("X-Captured-At", &chrono::Utc::now().to_rfc3339())
            .send_bytes(&snapshot)
            .map_err(Box::new)?;

        tracing::debug!(
            status = response.status(),
            bytes = snapshot.len(),
            node,
            "motion report delivered"
        );
        Ok(())
    }
}

impl std::fmt::Debug for HttpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNotifier")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_jpeg() {
        let frame = Frame::new(vec![128u8; 64 * 64], 64, 64, 1);
        let snapshot = HttpNotifier::encode_snapshot(&frame).unwrap();

        // JPEG start-of-image marker.
        assert_eq!(&snapshot[..2], &[0xFF, 0xD8]);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_invalid_frame_rejected() {
        let frame = Frame::new(vec![0u8; 10], 64, 64, 1);
        assert!(matches!(
            HttpNotifier::encode_snapshot(&frame),
            Err(NotifyError::InvalidFrame)
        ));
    }
}
