use std::time::Duration;

/// Delay sequence that spaces out `n` concurrent submissions
///
/// Produces `0, interval, 2*interval, ...` so bursts submitted together do
/// not all race the gate lock and the same tier's headroom in the same
/// instant. First-come-first-served under contention is correct either way;
/// staggering just spreads the arrivals.
pub fn schedule(n: usize, interval: Duration) -> Vec<Duration> {
    (0..n).map(|slot| interval.saturating_mul(slot as u32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_arithmetic() {
        let delays = schedule(4, Duration::from_millis(250));

        assert_eq!(
            delays,
            vec![Duration::ZERO, Duration::from_millis(250), Duration::from_millis(500), Duration::from_millis(750)]
        );
    }

    #[test]
    fn test_schedule_zero_slots() {
        assert!(schedule(0, Duration::from_millis(250)).is_empty());
    }

    #[test]
    fn test_schedule_zero_interval_collapses() {
        let delays = schedule(3, Duration::ZERO);

        assert_eq!(delays, vec![Duration::ZERO; 3]);
    }
}
