use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::GateConfig;
use crate::error::AdmissionError;
use crate::error::Result;
use crate::health::HealthState;
use crate::pool::CredentialPool;
use crate::status::CredentialStatus;
use crate::status::GateStatus;
use crate::status::TierStatus;
use crate::status::WindowStatus;
use crate::time::TimeSource;
use crate::window::UsageWindow;
use crate::window::WindowKind;

/// Remote-call outcome kinds reported back to the gate
///
/// The remote-call wrapper must report one of these after every real call;
/// this feedback loop is what corrects for underestimated block sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote side said we are over quota (429-class)
    RateLimited,

    /// The credential was rejected outright (401/403): revoked upstream
    Unauthorized,

    /// Anything else: timeouts, 5xx, transport faults
    Other,
}

/// A granted lease of remote-call budget
///
/// Ephemeral: lives only in process memory, for audit and for `release`.
/// The caller must perform its whole burst with exactly this credential.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// Logical name of the requesting caller
    pub caller: String,

    /// Block size charged upfront against both windows
    pub amount: u32,

    /// Credential the burst must use
    pub credential_id: String,

    /// That credential's access secret
    pub secret: String,

    /// Granted tier name
    pub tier: String,

    /// Grant timestamp in nanoseconds on the gate clock
    pub granted_at: u64,
}

/// The admission gate: multi-key, multi-tier quota limiter with upfront
/// block reservation and rotation/fallback
///
/// One mutex serializes every admission decision. Admission is a
/// check-then-act over all tiers of all credentials, so partial locking
/// would let two callers each see enough standalone headroom while
/// collectively over-committing. The lock is held only for the bounded
/// search-and-charge; remote calls happen entirely outside it.
pub struct QuotaGate {
    pool: Mutex<CredentialPool>,
    clock: TimeSource,
}

impl QuotaGate {
    /// Build a gate from validated configuration; cold start assumes full
    /// headroom on every window
    pub fn new(config: &GateConfig) -> Result<Self> {
        config.validate().map_err(AdmissionError::InvalidConfig)?;

        let clock = TimeSource::new();
        let pool = CredentialPool::from_config(config, clock.now_nanos());
        info!(credentials = pool.len(), "quota gate initialized");

        Ok(Self { pool: Mutex::new(pool), clock })
    }

    /// Atomically find and charge the first (credential, tier) able to admit
    /// a block of `amount` calls
    ///
    /// The full block is charged upfront against both windows of the selected
    /// tier. Pessimistic by design: a caller that uses less than it reserved
    /// leaves headroom parked until window reset unless it calls `release`,
    /// and in exchange no concurrent caller can ever observe stale headroom
    /// and over-admit.
    pub fn reserve(&self, caller: &str, amount: u32, preference: Option<&str>) -> Result<Reservation> {
        if amount == 0 {
            return Err(AdmissionError::InvalidArgument("block size must be positive"));
        }

        let now = self.clock.now_nanos();
        let mut pool = self.pool.lock();

        let order = pool.candidates(preference, now);
        if order.is_empty() {
            warn!(caller, "reservation denied: no credentials in rotation");
            return Err(AdmissionError::NoCredentialsAvailable);
        }

        let mut nearest_reset: Option<Duration> = None;
        let mut selected: Option<(usize, usize)> = None;

        for (ci, ti) in order {
            let tier = &mut pool.credential_mut(ci).tiers[ti];

            // A ceiling smaller than the request can never satisfy it; such
            // tiers are out of the search, not merely deprioritized, and do
            // not contribute to the wait hint either
            if !tier.can_ever_admit(amount) {
                continue;
            }

            if tier.headroom(now) >= amount {
                selected = Some((ci, ti));
                break;
            }

            let reset = tier.short_reset_in(now);
            nearest_reset = Some(nearest_reset.map_or(reset, |d| d.min(reset)));
        }

        let Some((ci, ti)) = selected else {
            warn!(caller, amount, retry_in = ?nearest_reset, "reservation denied: quota exhausted on all candidates");
            return Err(AdmissionError::QuotaExhausted { retry_in: nearest_reset });
        };

        let probing = pool.credential_mut(ci).health.state(now) == HealthState::HalfOpen;

        let credential = pool.credential_mut(ci);
        credential.tiers[ti].charge(amount, now);
        credential.active_tier = ti;
        if probing {
            credential.health.begin_probe(now);
            info!(credential_id = %credential.id(), "half-open probe granted");
        }

        let exhausted = !credential.has_headroom(now);
        let reservation = Reservation {
            caller: caller.to_string(),
            amount,
            credential_id: credential.id().to_string(),
            secret: credential.secret.clone(),
            tier: credential.tiers[ti].name().to_string(),
            granted_at: now,
        };

        if exhausted {
            // Spread load: the next reservation starts from a different
            // credential instead of hammering this ladder until window reset
            pool.advance_past(ci);
            info!(credential_id = %reservation.credential_id, "credential exhausted, rotation cursor advanced");
        }

        debug!(caller, amount, credential_id = %reservation.credential_id, tier = %reservation.tier, "reservation granted");
        Ok(reservation)
    }

    /// Reserve, sleeping through exhaustion on the gate's own retry hint
    ///
    /// Terminal outcomes (bad argument, empty pool, a block no ceiling could
    /// ever fit) are returned immediately; only recoverable exhaustion is
    /// waited out.
    pub async fn acquire(&self, caller: &str, amount: u32, preference: Option<&str>) -> Result<Reservation> {
        loop {
            match self.reserve(caller, amount, preference) {
                Ok(reservation) => return Ok(reservation),
                Err(AdmissionError::QuotaExhausted { retry_in: Some(wait) }) => {
                    tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Return unused units of a reservation to the granted tier
    ///
    /// Best-effort and optional: not calling it just means conservative
    /// accounting until the window resets. A caller that abandons its burst
    /// entirely should pass `actual_used = 0`.
    pub fn release(&self, reservation: &Reservation, actual_used: u32) -> Result<()> {
        let unused = reservation.amount.saturating_sub(actual_used);
        if unused == 0 {
            return Ok(());
        }

        let now = self.clock.now_nanos();
        let mut pool = self.pool.lock();
        let ci = pool
            .find_index(&reservation.credential_id)
            .ok_or_else(|| AdmissionError::UnknownCredential(reservation.credential_id.clone()))?;

        let credential = pool.credential_mut(ci);
        let Some(tier) = credential.tiers.iter_mut().find(|t| t.name() == reservation.tier) else {
            return Err(AdmissionError::InvalidArgument("reservation names a tier the credential does not have"));
        };

        tier.give_back(unused, now);
        debug!(caller = %reservation.caller, unused, credential_id = %reservation.credential_id, "unused reservation units returned");
        Ok(())
    }

    /// Record a successful remote call against a credential
    pub fn record_success(&self, credential_id: &str) -> Result<()> {
        let mut pool = self.pool.lock();
        let ci = pool.find_index(credential_id).ok_or_else(|| AdmissionError::UnknownCredential(credential_id.to_string()))?;

        pool.credential_mut(ci).health.record_success();
        Ok(())
    }

    /// Record a failed remote call against a credential
    ///
    /// RateLimited zeroes the short-window headroom of the credential's
    /// active tier: the external signal is authoritative over our estimate.
    pub fn record_failure(&self, credential_id: &str, kind: FailureKind) -> Result<()> {
        let now = self.clock.now_nanos();
        let mut pool = self.pool.lock();
        let ci = pool.find_index(credential_id).ok_or_else(|| AdmissionError::UnknownCredential(credential_id.to_string()))?;
        let credential = pool.credential_mut(ci);

        match kind {
            FailureKind::RateLimited => {
                let ti = credential.active_tier;
                credential.tiers[ti].exhaust_short(now);
                info!(credential_id, tier = %credential.tiers[ti].name(), "remote rate limit hit, short-window headroom zeroed");
            }
            FailureKind::Unauthorized => {
                credential.health.revoke();
                warn!(credential_id, "credential rejected upstream, removed from rotation permanently");
            }
            FailureKind::Other => {
                let before = credential.health.state(now);
                credential.health.record_failure(now);
                let after = credential.health.state(now);
                if before != after {
                    info!(credential_id, from = before.label(), to = after.label(), "credential health transition");
                }
            }
        }

        Ok(())
    }

    /// Read-only snapshot of every credential and tier, for operators
    pub fn status(&self) -> GateStatus {
        let now = self.clock.now_nanos();
        let mut pool = self.pool.lock();

        let credentials = pool
            .credentials_mut()
            .iter_mut()
            .map(|credential| {
                let health = credential.health.state(now);
                let score = credential.health.score();
                let tiers = credential
                    .tiers
                    .iter_mut()
                    .map(|tier| TierStatus {
                        name: tier.name().to_string(),
                        short: window_status(tier.window_mut(WindowKind::Short), now),
                        long: window_status(tier.window_mut(WindowKind::Long), now),
                    })
                    .collect();

                CredentialStatus { id: credential.id().to_string(), health, score, tiers }
            })
            .collect();

        GateStatus { credentials }
    }
}

fn window_status(window: &mut UsageWindow, now: u64) -> WindowStatus {
    WindowStatus { used: window.used(now), ceiling: window.ceiling(), reset_in_ms: window.reset_in(now).as_millis() as u64 }
}
