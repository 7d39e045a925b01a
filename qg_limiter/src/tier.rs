use std::time::Duration;

use crate::config::TierConfig;
use crate::window::UsageWindow;
use crate::window::WindowKind;

/// Runtime state of one quota tier: a name plus two independent ceilings
///
/// A reservation is admissible on a tier only when it fits under both the
/// short (burst) and long (consumption) windows at once.
#[derive(Debug)]
pub struct TierState {
    name: String,
    short: UsageWindow,
    long: UsageWindow,
}

impl TierState {
    /// Build a fresh tier from config, both windows starting at `now`
    pub fn from_config(config: &TierConfig, now: u64) -> Self {
        Self {
            name: config.name.clone(),
            short: UsageWindow::new(config.short_ceiling, Duration::from_secs(config.short_window_secs), now),
            long: UsageWindow::new(config.long_ceiling, Duration::from_secs(config.long_window_secs), now),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Headroom is bounded by the tighter of the two windows
    pub fn headroom(&mut self, now: u64) -> u32 {
        self.short.headroom(now).min(self.long.headroom(now))
    }

    /// Whether a block of `amount` could fit even on a freshly reset tier
    ///
    /// A tier whose ceiling itself is too small can never satisfy the request
    /// and is excluded from the admissible search entirely.
    pub fn can_ever_admit(&self, amount: u32) -> bool {
        amount <= self.short.ceiling() && amount <= self.long.ceiling()
    }

    /// Charge a granted block against both windows
    pub fn charge(&mut self, amount: u32, now: u64) {
        self.short.consume(amount, now);
        self.long.consume(amount, now);
    }

    /// Return unused units from a released reservation to both windows
    pub fn give_back(&mut self, amount: u32, now: u64) {
        self.short.give_back(amount, now);
        self.long.give_back(amount, now);
    }

    /// Burn all short-window headroom for the rest of the current window
    pub fn exhaust_short(&mut self, now: u64) {
        self.short.exhaust(now);
    }

    /// Time until the short window elapses
    pub fn short_reset_in(&self, now: u64) -> Duration {
        self.short.reset_in(now)
    }

    /// Borrow one of the two windows, for status reporting
    pub fn window_mut(&mut self, kind: WindowKind) -> &mut UsageWindow {
        match kind {
            WindowKind::Short => &mut self.short,
            WindowKind::Long => &mut self.long,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60_000_000_000;

    fn tier() -> TierState {
        let config =
            TierConfig { name: "flash".into(), short_ceiling: 10, short_window_secs: 60, long_ceiling: 250, long_window_secs: 86_400 };
        TierState::from_config(&config, 0)
    }

    #[test]
    fn test_headroom_is_min_of_both_windows() {
        let mut t = tier();
        assert_eq!(t.headroom(0), 10);

        t.charge(8, 0);
        assert_eq!(t.headroom(0), 2);

        // Short window resets; long usage persists, but short is tighter
        assert_eq!(t.headroom(MINUTE), 10);
    }

    #[test]
    fn test_long_window_binds_once_short_resets_enough() {
        let config = TierConfig { name: "flash".into(), short_ceiling: 10, short_window_secs: 60, long_ceiling: 15, long_window_secs: 86_400 };
        let mut t = TierState::from_config(&config, 0);

        t.charge(10, 0);
        // Short reset, but only 5 remain under the long ceiling
        assert_eq!(t.headroom(MINUTE), 5);
    }

    #[test]
    fn test_can_ever_admit_checks_ceilings_not_usage() {
        let mut t = tier();
        t.charge(10, 0);

        // Fully used, yet 10 could still fit after a reset
        assert!(t.can_ever_admit(10));
        // 11 never fits the short ceiling regardless of usage
        assert!(!t.can_ever_admit(11));
    }

    #[test]
    fn test_exhaust_short_leaves_long_untouched() {
        let mut t = tier();
        t.charge(2, 0);
        t.exhaust_short(0);

        assert_eq!(t.headroom(0), 0);
        // After the short reset the long window still only carries 2
        assert_eq!(t.window_mut(WindowKind::Long).used(MINUTE), 2);
        assert_eq!(t.headroom(MINUTE), 10);
    }

    #[test]
    fn test_give_back_restores_both_windows() {
        let mut t = tier();
        t.charge(8, 0);
        t.give_back(5, 0);

        assert_eq!(t.window_mut(WindowKind::Short).used(0), 3);
        assert_eq!(t.window_mut(WindowKind::Long).used(0), 3);
    }
}
