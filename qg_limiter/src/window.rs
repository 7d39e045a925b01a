use std::time::Duration;

use crate::time::duration_to_nanos;

/// Which of a tier's two ceilings a usage figure counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Burst ceiling, e.g. per-minute
    Short,
    /// Consumption ceiling, e.g. per-day
    Long,
}

/// Usage counter against one ceiling within a rolling time bucket
///
/// Pure bookkeeping with no policy and no interior locking: the coordinator's
/// lock covers every call. Window resets are lazy — each read or write first
/// normalizes the counter against the caller-supplied timestamp, so a window
/// that sat dormant across several boundaries snaps forward in one step.
/// Timestamps are nanoseconds on the gate's shared monotonic clock.
#[derive(Debug)]
pub struct UsageWindow {
    /// Maximum permitted count within one window
    ceiling: u32,

    /// Window length in nanoseconds
    window_nanos: u64,

    /// Count consumed in the current window
    used: u32,

    /// Start of the current window, nanoseconds since the gate epoch
    window_start: u64,
}

impl UsageWindow {
    /// Create a fresh window with zero usage starting at `now`
    pub fn new(ceiling: u32, window: Duration, now: u64) -> Self {
        debug_assert!(ceiling > 0, "ceiling must be greater than 0");
        debug_assert!(!window.is_zero(), "window must be greater than 0");

        Self { ceiling, window_nanos: duration_to_nanos(window), used: 0, window_start: now }
    }

    /// Advance the window if `now` has crossed one or more boundaries
    ///
    /// The new window start stays aligned to the original boundary grid so
    /// repeated normalization is idempotent.
    #[inline]
    fn normalize(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < self.window_nanos {
            return;
        }

        let windows_elapsed = elapsed / self.window_nanos;
        self.window_start += windows_elapsed * self.window_nanos;
        self.used = 0;
    }

    /// Remaining count before the ceiling, after lazy reset
    pub fn headroom(&mut self, now: u64) -> u32 {
        self.normalize(now);
        self.ceiling - self.used
    }

    /// Charge `amount` against this window
    ///
    /// Callers must have checked headroom under the same lock; the counter is
    /// clamped at the ceiling so a violation can never push it past the limit.
    pub fn consume(&mut self, amount: u32, now: u64) {
        self.normalize(now);
        debug_assert!(self.used + amount <= self.ceiling, "consume past ceiling");
        self.used = self.used.saturating_add(amount).min(self.ceiling);
    }

    /// Return `amount` unused units to this window, clamped at zero
    pub fn give_back(&mut self, amount: u32, now: u64) {
        self.normalize(now);
        self.used = self.used.saturating_sub(amount);
    }

    /// Burn all remaining headroom for the rest of the current window
    ///
    /// Used when the remote side says we are rate limited: the external
    /// signal is authoritative over the internal estimate.
    pub fn exhaust(&mut self, now: u64) {
        self.normalize(now);
        self.used = self.ceiling;
    }

    /// Time until the current window elapses and usage resets
    pub fn reset_in(&self, now: u64) -> Duration {
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed >= self.window_nanos {
            return Duration::ZERO;
        }

        Duration::from_nanos(self.window_nanos - elapsed)
    }

    /// Count consumed in the current window, after lazy reset
    pub fn used(&mut self, now: u64) -> u32 {
        self.normalize(now);
        self.used
    }

    /// Maximum permitted count within one window
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60_000_000_000;

    #[test]
    fn test_fresh_window_has_full_headroom() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);

        assert_eq!(w.headroom(0), 10);
        assert_eq!(w.used(0), 0);
        assert_eq!(w.ceiling(), 10);
    }

    #[test]
    fn test_consume_reduces_headroom() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);

        w.consume(4, 0);
        assert_eq!(w.headroom(0), 6);

        w.consume(6, 0);
        assert_eq!(w.headroom(0), 0);
    }

    #[test]
    fn test_lazy_reset_after_window_elapses() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);
        w.consume(10, 0);
        assert_eq!(w.headroom(MINUTE - 1), 0);

        // Crossing the boundary restores the full ceiling regardless of
        // whether anything touched the window while it was dormant
        assert_eq!(w.headroom(MINUTE), 10);
        assert_eq!(w.used(MINUTE), 0);
    }

    #[test]
    fn test_reset_is_aligned_after_dormant_windows() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);
        w.consume(10, 0);

        // Sleep across 2.5 windows; the new window should start at 2 minutes
        w.consume(1, 2 * MINUTE + MINUTE / 2);
        assert_eq!(w.reset_in(2 * MINUTE + MINUTE / 2), Duration::from_secs(30));
    }

    #[test]
    fn test_give_back_clamps_at_zero() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);
        w.consume(3, 0);

        w.give_back(5, 0);
        assert_eq!(w.used(0), 0);
        assert_eq!(w.headroom(0), 10);
    }

    #[test]
    fn test_exhaust_burns_remaining_headroom() {
        let mut w = UsageWindow::new(10, Duration::from_secs(60), 0);
        w.consume(2, 0);

        w.exhaust(0);
        assert_eq!(w.headroom(0), 0);

        // Next window recovers in full
        assert_eq!(w.headroom(MINUTE), 10);
    }

    #[test]
    fn test_reset_in_counts_down() {
        let w = UsageWindow::new(10, Duration::from_secs(60), 0);

        assert_eq!(w.reset_in(0), Duration::from_secs(60));
        assert_eq!(w.reset_in(MINUTE / 2), Duration::from_secs(30));
        assert_eq!(w.reset_in(MINUTE), Duration::ZERO);
    }
}
