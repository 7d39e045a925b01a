use std::time::Duration;

use crate::config::CredentialConfig;
use crate::config::GateConfig;
use crate::health::CredentialHealth;
use crate::tier::TierState;

/// Runtime state of one credential: identity, tier ladder, health
///
/// Created from configuration at startup and kept for the process lifetime;
/// only usage and health fields ever change.
#[derive(Debug)]
pub struct CredentialState {
    pub(crate) id: String,
    pub(crate) secret: String,
    pub(crate) tiers: Vec<TierState>,
    pub(crate) health: CredentialHealth,
    /// Tier index of the most recent grant, targeted by RateLimited signals
    pub(crate) active_tier: usize,
}

impl CredentialState {
    fn from_config(config: &CredentialConfig, dead_threshold: f64, recovery: Duration, now: u64) -> Self {
        Self {
            id: config.id.clone(),
            secret: config.secret.clone(),
            tiers: config.tiers.iter().map(|t| TierState::from_config(t, now)).collect(),
            health: CredentialHealth::new(dead_threshold, recovery),
            active_tier: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether any tier still has a single unit of headroom
    pub fn has_headroom(&mut self, now: u64) -> bool {
        self.tiers.iter_mut().any(|t| t.headroom(now) > 0)
    }
}

/// The ordered credential set and its rotation cursor
///
/// Fallback order is an explicit, testable contract: the cursor credential's
/// tiers in configured order first, then subsequent credentials in pool
/// order, wrapping around once. Credentials out of rotation (dead) are
/// skipped; the cursor itself only moves when `advance_past` is called.
#[derive(Debug)]
pub struct CredentialPool {
    credentials: Vec<CredentialState>,
    cursor: usize,
}

impl CredentialPool {
    /// Build the pool from validated configuration
    pub fn from_config(config: &GateConfig, now: u64) -> Self {
        let recovery = Duration::from_secs(config.health_recovery_secs);
        let credentials = config
            .credentials
            .iter()
            .map(|c| CredentialState::from_config(c, config.dead_health_threshold, recovery, now))
            .collect();

        Self { credentials, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn credential_mut(&mut self, index: usize) -> &mut CredentialState {
        &mut self.credentials[index]
    }

    pub(crate) fn credentials_mut(&mut self) -> &mut [CredentialState] {
        &mut self.credentials
    }

    pub fn find_index(&self, id: &str) -> Option<usize> {
        self.credentials.iter().position(|c| c.id == id)
    }

    /// Whether at least one credential is still in rotation
    pub fn any_in_rotation(&self, now: u64) -> bool {
        self.credentials.iter().any(|c| c.health.in_rotation(now))
    }

    /// The (credential, tier) index pairs to try, in fallback order
    ///
    /// Starts at the rotation cursor and wraps around the pool once. Dead
    /// credentials are skipped; half-open ones are offered (the probe).
    /// When a tier `preference` is given, matching tiers are tried before
    /// the rest of each credential's ladder, preserving configured order
    /// within each group.
    pub fn candidates(&self, preference: Option<&str>, now: u64) -> Vec<(usize, usize)> {
        let n = self.credentials.len();
        let mut order = Vec::new();

        for offset in 0..n {
            let ci = (self.cursor + offset) % n;
            let credential = &self.credentials[ci];
            if !credential.health.in_rotation(now) {
                continue;
            }

            if let Some(name) = preference {
                for (ti, tier) in credential.tiers.iter().enumerate() {
                    if tier.name() == name {
                        order.push((ci, ti));
                    }
                }
                for (ti, tier) in credential.tiers.iter().enumerate() {
                    if tier.name() != name {
                        order.push((ci, ti));
                    }
                }
            } else {
                for ti in 0..credential.tiers.len() {
                    order.push((ci, ti));
                }
            }
        }

        order
    }

    /// Point the cursor at the credential after `index`
    ///
    /// Called when a grant exhausted the credential, so the next reservation
    /// starts from a different one instead of hammering the same ladder.
    pub fn advance_past(&mut self, index: usize) {
        if !self.credentials.is_empty() {
            self.cursor = (index + 1) % self.credentials.len();
        }
    }

    /// Move the rotation cursor to the next credential in pool order
    pub fn advance_cursor(&mut self) {
        self.advance_past(self.cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierConfig;

    fn tier_config(name: &str) -> TierConfig {
        TierConfig { name: name.to_string(), short_ceiling: 10, short_window_secs: 60, long_ceiling: 250, long_window_secs: 86_400 }
    }

    fn pool(ids: &[&str]) -> CredentialPool {
        let config = GateConfig {
            credentials: ids
                .iter()
                .map(|id| CredentialConfig {
                    id: id.to_string(),
                    secret: format!("secret-{id}"),
                    tiers: vec![tier_config("flash"), tier_config("deep")],
                })
                .collect(),
            ..GateConfig::default()
        };
        CredentialPool::from_config(&config, 0)
    }

    #[test]
    fn test_candidate_order_walks_tiers_then_credentials() {
        let p = pool(&["a", "b"]);

        assert_eq!(p.candidates(None, 0), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_cursor_rotates_candidate_order() {
        let mut p = pool(&["a", "b", "c"]);
        p.advance_cursor();

        let order = p.candidates(None, 0);
        assert_eq!(order[0], (1, 0));
        // Wraps around the pool once
        assert_eq!(order.last(), Some(&(0, 1)));
    }

    #[test]
    fn test_dead_credential_is_skipped() {
        let mut p = pool(&["a", "b"]);
        for _ in 0..3 {
            p.credential_mut(0).health.record_failure(0);
        }

        let order = p.candidates(None, 0);
        assert!(order.iter().all(|&(ci, _)| ci == 1));
    }

    #[test]
    fn test_preference_moves_matching_tier_first() {
        let p = pool(&["a"]);

        assert_eq!(p.candidates(Some("deep"), 0), vec![(0, 1), (0, 0)]);
    }

    #[test]
    fn test_unknown_preference_keeps_configured_order() {
        let p = pool(&["a"]);

        assert_eq!(p.candidates(Some("bogus"), 0), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_advance_past_wraps() {
        let mut p = pool(&["a", "b"]);
        p.advance_past(1);

        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn test_any_in_rotation_false_when_all_revoked() {
        let mut p = pool(&["a", "b"]);
        p.credential_mut(0).health.revoke();
        p.credential_mut(1).health.revoke();

        assert!(!p.any_in_rotation(0));
        assert!(p.candidates(None, 0).is_empty());
    }
}
