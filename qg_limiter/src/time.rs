use std::time::Duration;
use std::time::Instant;

/// Time tracking for the admission gate
///
/// Uses Instant for monotonic time measurements with nanosecond precision.
/// All window bookkeeping is expressed as nanoseconds since this epoch so
/// that every counter in the pool shares one clock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeSource {
    /// Epoch for relative time measurements
    epoch: Instant,
}

impl TimeSource {
    /// Create a new time source with current time as epoch
    #[inline(always)]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }

    /// Get current time in nanoseconds since epoch
    #[inline(always)]
    pub fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert duration to nanoseconds
#[inline(always)]
pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
    duration.as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_source_is_monotonic() {
        let ts = TimeSource::new();
        let t1 = ts.now_nanos();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = ts.now_nanos();

        assert!(t2 > t1);
        assert!(t2 - t1 >= duration_to_nanos(Duration::from_millis(10)));
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(duration_to_nanos(Duration::from_secs(1)), 1_000_000_000);
        assert_eq!(duration_to_nanos(Duration::from_millis(1)), 1_000_000);
    }
}
