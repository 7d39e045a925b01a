use std::time::Duration;

use crate::time::duration_to_nanos;

/// Best score a credential can carry
pub const SCORE_CEILING: f64 = 100.0;

/// Score restored after a successful half-open probe
const HALF_OPEN_RESTORE: f64 = 50.0;

/// Score regained per recorded success
const RECOVERY_STEP: f64 = 5.0;

/// Score lost per recorded (non-revoking) failure
const DECAY_STEP: f64 = 25.0;

/// Below this score a live credential reads as degraded
const DEGRADED_FLOOR: f64 = 70.0;

/// Credential health, as seen by the candidate search
///
/// Transitions:
/// - Healthy ⇄ Degraded (score crossing the degraded floor)
/// - Degraded → Dead (failure pushed score below the dead threshold)
/// - Dead → HalfOpen (recovery period elapsed)
/// - HalfOpen → Healthy-side (probe success) or Dead (probe failure)
/// - any → Dead, permanently (revoked)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Dead,
    HalfOpen,
}

impl HealthState {
    /// Status label for logging
    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Dead => "dead",
            HealthState::HalfOpen => "half_open",
        }
    }
}

/// Per-credential health score and dead/half-open bookkeeping
///
/// Deadness is event-driven: a failure that leaves the score below the
/// configured threshold stamps `dead_since`, and only a successful half-open
/// probe (or revocation, permanently) changes that verdict. Elapsed time is
/// read lazily by `state`, the same way the usage windows reset.
#[derive(Debug)]
pub struct CredentialHealth {
    /// Current score in `[0, SCORE_CEILING]`
    score: f64,

    /// Permanently out of rotation (unauthorized / revoked upstream)
    revoked: bool,

    /// When the credential left rotation, if it has
    dead_since: Option<u64>,

    /// A half-open probe has been granted and its outcome is pending
    probe_inflight: bool,

    /// Score below which a failure takes the credential out of rotation
    dead_threshold: f64,

    /// Time out of rotation before a half-open probe is allowed
    recovery_nanos: u64,
}

impl CredentialHealth {
    pub fn new(dead_threshold: f64, recovery: Duration) -> Self {
        Self {
            score: SCORE_CEILING,
            revoked: false,
            dead_since: None,
            probe_inflight: false,
            dead_threshold,
            recovery_nanos: duration_to_nanos(recovery),
        }
    }

    /// Current state, computed lazily from the stored events and `now`
    pub fn state(&self, now: u64) -> HealthState {
        if self.revoked {
            return HealthState::Dead;
        }

        if let Some(since) = self.dead_since {
            if now.saturating_sub(since) >= self.recovery_nanos {
                return HealthState::HalfOpen;
            }
            return HealthState::Dead;
        }

        if self.score < DEGRADED_FLOOR { HealthState::Degraded } else { HealthState::Healthy }
    }

    /// Whether the candidate search may offer this credential
    pub fn in_rotation(&self, now: u64) -> bool {
        !matches!(self.state(now), HealthState::Dead)
    }

    /// Mark that a half-open probe has been granted
    ///
    /// Restarts the recovery timer so no second probe is offered until this
    /// one reports an outcome or another full recovery period passes.
    pub fn begin_probe(&mut self, now: u64) {
        self.probe_inflight = true;
        self.dead_since = Some(now);
    }

    pub fn record_success(&mut self) {
        if self.revoked {
            return;
        }

        if self.dead_since.is_some() {
            if self.probe_inflight {
                self.probe_inflight = false;
                self.dead_since = None;
                self.score = HALF_OPEN_RESTORE;
            }
            // A late success from a burst granted before death does not
            // resurrect the credential on its own
            return;
        }

        self.score = (self.score + RECOVERY_STEP).min(SCORE_CEILING);
    }

    pub fn record_failure(&mut self, now: u64) {
        if self.revoked {
            return;
        }

        self.probe_inflight = false;
        self.score = (self.score - DECAY_STEP).max(0.0);
        if self.score < self.dead_threshold {
            self.dead_since = Some(now);
        }
    }

    /// Remove the credential from rotation permanently
    pub fn revoke(&mut self) {
        self.revoked = true;
        self.probe_inflight = false;
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }
}
