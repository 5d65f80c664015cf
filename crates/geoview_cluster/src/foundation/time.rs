//! Time management utilities

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Monotonic clock relative to the start of the application.
///
/// Simulation time handed to every process is derived from this clock, so it
/// never runs backwards even when the wall clock is adjusted.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock that starts now
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Restart the clock at the current instant
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Milliseconds since the clock started
    pub fn elapsed_millis(&self) -> i64 {
        i64::try_from(self.start.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// Convert framework time in milliseconds to simulation seconds
pub fn millis_to_seconds(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

/// Current wall-clock time in seconds since the unix epoch
pub fn calendar_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_seconds() {
        assert!((millis_to_seconds(1500) - 1.5).abs() < f64::EPSILON);
        assert!(millis_to_seconds(0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = FrameClock::new();
        let first = clock.elapsed_millis();
        let second = clock.elapsed_millis();
        assert!(second >= first);
        assert!(calendar_now() > 0);
    }
}
