//! Achieved-rate measurement.
//!
//! The meter counts completed passes inside a window of at least one second.
//! When the window is rolled, the count is normalized by the real window
//! length so a window that ran slightly long does not under-report.

use std::time::{Duration, Instant};

/// Minimum length of a measurement window.
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Pass counter with a one-second publishing window.
///
/// # RT-Safety
///
/// All methods are O(1) and allocation-free.
#[derive(Debug, Clone)]
pub struct RateMeter {
    /// Passes completed in the current window
    passes: u64,

    /// Start of the current window
    window_start: Instant,
}

impl RateMeter {
    /// Create a meter whose first window starts at `window_start`.
    pub fn new(window_start: Instant) -> Self {
        Self {
            passes: 0,
            window_start,
        }
    }

    /// Count one completed pass in the current window.
    #[inline]
    pub fn record_pass(&mut self) {
        self.passes = self.passes.saturating_add(1);
    }

    /// Publish the window if at least [`RATE_WINDOW`] has elapsed by `now`.
    ///
    /// Returns the newly published rate when the window rolled over.
    pub fn maybe_roll(&mut self, now: Instant) -> Option<u16> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < RATE_WINDOW {
            return None;
        }

        let rate = normalized_rate(self.passes, elapsed);
        self.passes = 0;
        self.window_start = now;
        Some(rate)
    }

    /// Passes counted so far in the open window.
    #[inline]
    pub fn window_passes(&self) -> u64 {
        self.passes
    }
}

/// Convert a pass count over `elapsed` into passes per second, rounded to
/// the nearest integer and saturated to `u16`.
pub fn normalized_rate(passes: u64, elapsed: Duration) -> u16 {
    let elapsed_ns = elapsed.as_nanos();
    if elapsed_ns == 0 {
        return u16::try_from(passes).unwrap_or(u16::MAX);
    }

    let scaled = u128::from(passes).saturating_mul(1_000_000_000);
    let rounded = scaled.saturating_add(elapsed_ns / 2) / elapsed_ns;
    u16::try_from(rounded).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn after(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_meter_creation() {
        let meter = RateMeter::new(Instant::now());
        assert_eq!(meter.window_passes(), 0);
    }

    #[test]
    fn test_no_roll_before_window() {
        let start = Instant::now();
        let mut meter = RateMeter::new(start);
        for _ in 0..30 {
            meter.record_pass();
        }

        assert_eq!(meter.maybe_roll(after(start, 999)), None);
        assert_eq!(meter.window_passes(), 30);
    }

    #[test]
    fn test_roll_publishes_and_resets() {
        let start = Instant::now();
        let mut meter = RateMeter::new(start);
        for _ in 0..60 {
            meter.record_pass();
        }

        let rolled_at = after(start, 1000);
        assert_eq!(meter.maybe_roll(rolled_at), Some(60));
        assert_eq!(meter.window_passes(), 0);

        // The next window is measured from the roll, not from `start`
        meter.record_pass();
        assert_eq!(meter.maybe_roll(after(start, 1999)), None);
        assert_eq!(meter.maybe_roll(after(start, 2000)), Some(1));
    }

    #[test]
    fn test_long_window_is_normalized() {
        let start = Instant::now();
        let mut meter = RateMeter::new(start);
        for _ in 0..90 {
            meter.record_pass();
        }

        // 90 passes over 1.5s is 60 per second, not 90
        assert_eq!(meter.maybe_roll(after(start, 1500)), Some(60));
    }

    #[test]
    fn test_open_window_does_not_publish() {
        let start = Instant::now();
        let mut meter = RateMeter::new(start);
        for _ in 0..3 {
            meter.record_pass();
        }
        assert_eq!(meter.maybe_roll(after(start, 1000)), Some(3));

        meter.record_pass();
        assert_eq!(meter.maybe_roll(after(start, 1400)), None);
        assert_eq!(meter.window_passes(), 1);
    }

    #[test]
    fn test_normalized_rate() {
        assert_eq!(normalized_rate(0, Duration::from_secs(1)), 0);
        assert_eq!(normalized_rate(45, Duration::from_secs(1)), 45);
        assert_eq!(normalized_rate(3, Duration::from_millis(1001)), 3);
        assert_eq!(normalized_rate(100, Duration::from_secs(2)), 50);
        assert_eq!(normalized_rate(7, Duration::ZERO), 7);
        assert_eq!(normalized_rate(u64::MAX, Duration::from_secs(1)), u16::MAX);
    }
}
