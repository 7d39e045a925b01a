use crate::health::HealthState;

/// Read-only usage snapshot of one window
#[derive(Debug, Clone, serde::Serialize)]
pub struct WindowStatus {
    pub used: u32,
    pub ceiling: u32,
    pub reset_in_ms: u64,
}

/// Read-only snapshot of one tier
#[derive(Debug, Clone, serde::Serialize)]
pub struct TierStatus {
    pub name: String,
    pub short: WindowStatus,
    pub long: WindowStatus,
}

/// Read-only snapshot of one credential
#[derive(Debug, Clone, serde::Serialize)]
pub struct CredentialStatus {
    pub id: String,
    pub health: HealthState,
    pub score: f64,
    pub tiers: Vec<TierStatus>,
}

/// Operational snapshot of the whole pool, taken under the gate lock
///
/// Consumed by status tooling; serialisable as-is.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GateStatus {
    pub credentials: Vec<CredentialStatus>,
}
