//! Debounce and throttle policy for motion reports.
//!
//! Converts the noisy per-frame motion signal into a low-rate event
//! stream with a two-stage gate: a time throttle between reports, then a
//! consecutive-frame count. Isolated single-frame flicker never emits,
//! and repeated emissions are rate-limited regardless of how long the
//! motion persists.

use std::time::{Duration, Instant};

/// Per-frame decision of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep watching; nothing to report.
    Hold,
    /// Sustained motion crossed the report criteria this frame.
    Emit,
}

/// Accumulates per-frame motion evidence into reportable events.
#[derive(Debug)]
pub struct EventDebouncer {
    min_frames: u32,
    min_interval: Duration,
    streak: u32,
    last_emitted: Option<Instant>,
}

impl EventDebouncer {
    /// Creates a debouncer requiring `min_frames` consecutive qualifying
    /// frames, with at least `min_interval` between emissions.
    pub fn new(min_frames: u32, min_interval: Duration) -> Self {
        Self {
            min_frames: min_frames.max(1),
            min_interval,
            streak: 0,
            last_emitted: None,
        }
    }

    /// Feeds one frame's motion signal and decides whether to emit.
    ///
    /// The throttle check precedes counting: frames inside the throttle
    /// window do not grow the streak. The streak resets on every quiet
    /// frame and immediately after an emission.
    pub fn observe(&mut self, qualifying: bool, now: Instant) -> Decision {
        if !qualifying {
            self.streak = 0;
            return Decision::Hold;
        }

        if let Some(last) = self.last_emitted {
            if now.duration_since(last) < self.min_interval {
                return Decision::Hold;
            }
        }

        self.streak += 1;
        if self.streak >= self.min_frames {
            self.last_emitted = Some(now);
            self.streak = 0;
            tracing::debug!("motion evidence crossed report criteria");
            return Decision::Emit;
        }

        Decision::Hold
    }

    /// Returns the current consecutive-motion streak.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Returns the time of the most recent emission, if any.
    pub fn last_emitted(&self) -> Option<Instant> {
        self.last_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn test_streak_below_minimum_never_emits() {
        let mut debouncer = EventDebouncer::new(3, Duration::from_secs(10));
        let base = Instant::now();

        assert_eq!(debouncer.observe(true, at(base, 1)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 2)), Decision::Hold);
        assert_eq!(debouncer.observe(false, at(base, 3)), Decision::Hold);
        assert_eq!(debouncer.streak(), 0);

        // The reset means two more qualifying frames still are not enough.
        assert_eq!(debouncer.observe(true, at(base, 4)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 5)), Decision::Hold);
        assert!(debouncer.last_emitted().is_none());
    }

    #[test]
    fn test_emits_on_nth_consecutive_frame() {
        let mut debouncer = EventDebouncer::new(3, Duration::from_secs(10));
        let base = Instant::now();

        assert_eq!(debouncer.observe(true, at(base, 1)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 2)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 3)), Decision::Emit);
        assert_eq!(debouncer.streak(), 0);
    }

    #[test]
    fn test_throttle_window_blocks_counting() {
        let mut debouncer = EventDebouncer::new(3, Duration::from_secs(10));
        let base = Instant::now();

        for second in 1..=3 {
            debouncer.observe(true, at(base, second));
        }

        // One second after the emission: qualifying, but throttled, and
        // the streak does not grow inside the window.
        assert_eq!(debouncer.observe(true, at(base, 4)), Decision::Hold);
        assert_eq!(debouncer.streak(), 0);
    }

    #[test]
    fn test_two_close_episodes_emit_once() {
        let mut debouncer = EventDebouncer::new(2, Duration::from_secs(10));
        let base = Instant::now();

        debouncer.observe(true, at(base, 1));
        assert_eq!(debouncer.observe(true, at(base, 2)), Decision::Emit);

        // Second episode starts 3 seconds later, inside the window.
        assert_eq!(debouncer.observe(false, at(base, 3)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 5)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 6)), Decision::Hold);
    }

    #[test]
    fn test_emission_allowed_after_window_elapses() {
        let mut debouncer = EventDebouncer::new(2, Duration::from_secs(10));
        let base = Instant::now();

        debouncer.observe(true, at(base, 1));
        assert_eq!(debouncer.observe(true, at(base, 2)), Decision::Emit);

        assert_eq!(debouncer.observe(true, at(base, 13)), Decision::Hold);
        assert_eq!(debouncer.observe(true, at(base, 14)), Decision::Emit);
    }

    #[test]
    fn test_fractional_interval_comparison() {
        let mut debouncer = EventDebouncer::new(1, Duration::from_millis(1500));
        let base = Instant::now();

        assert_eq!(debouncer.observe(true, base), Decision::Emit);
        // 1.0s elapsed: inside the 1.5s window even though a whole second passed.
        assert_eq!(
            debouncer.observe(true, base + Duration::from_millis(1000)),
            Decision::Hold
        );
        assert_eq!(
            debouncer.observe(true, base + Duration::from_millis(1600)),
            Decision::Emit
        );
    }

    proptest! {
        #[test]
        fn quiet_streams_never_emit(frames in 0usize..200) {
            let mut debouncer = EventDebouncer::new(3, Duration::from_secs(1));
            let base = Instant::now();

            for i in 0..frames {
                let now = base + Duration::from_millis(i as u64 * 100);
                prop_assert_eq!(debouncer.observe(false, now), Decision::Hold);
                prop_assert_eq!(debouncer.streak(), 0);
            }
            prop_assert!(debouncer.last_emitted().is_none());
        }
    }
}
