use std::collections::HashMap;

/// Quota class definition for one tier of a credential
///
/// Tiers are listed in fallback order: cheapest / most available first. Both
/// ceilings apply simultaneously; a reservation must fit under each.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TierConfig {
    /// Tier name, unique within its credential
    pub name: String,

    /// Maximum calls within one short window (burst ceiling)
    pub short_ceiling: u32,

    /// Short window length in seconds
    pub short_window_secs: u64,

    /// Maximum calls within one long window (consumption ceiling)
    pub long_ceiling: u32,

    /// Long window length in seconds
    pub long_window_secs: u64,
}

/// One credential and its tier ladder
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CredentialConfig {
    /// Identifier, unique within the pool
    pub id: String,

    /// Opaque access secret handed back to callers on a grant
    pub secret: String,

    /// Tiers in fallback order
    pub tiers: Vec<TierConfig>,
}

/// Gate-wide settings
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GateConfig {
    /// Credentials in rotation order
    pub credentials: Vec<CredentialConfig>,

    /// Health score below which a credential leaves rotation
    #[serde(default = "default_dead_health_threshold")]
    pub dead_health_threshold: f64,

    /// Seconds out of rotation before a dead credential is probed half-open
    #[serde(default = "default_health_recovery_secs")]
    pub health_recovery_secs: u64,

    /// Spacing between concurrent submission slots
    #[serde(default = "default_stagger_interval_ms")]
    pub stagger_interval_ms: u64,

    /// Default reservation block size per caller class
    #[serde(default)]
    pub default_block_sizes: HashMap<String, u32>,
}

fn default_dead_health_threshold() -> f64 {
    30.0
}

fn default_health_recovery_secs() -> u64 {
    300
}

fn default_stagger_interval_ms() -> u64 {
    250
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            dead_health_threshold: default_dead_health_threshold(),
            health_recovery_secs: default_health_recovery_secs(),
            stagger_interval_ms: default_stagger_interval_ms(),
            default_block_sizes: HashMap::new(),
        }
    }
}

impl GateConfig {
    /// Reject configurations the gate cannot run with
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.credentials.is_empty() {
            return Err("at least one credential is required");
        }

        for credential in &self.credentials {
            if credential.id.is_empty() {
                return Err("credential id must not be empty");
            }
            if credential.tiers.is_empty() {
                return Err("every credential needs at least one tier");
            }
            for tier in &credential.tiers {
                if tier.short_ceiling == 0 || tier.long_ceiling == 0 {
                    return Err("tier ceilings must be greater than 0");
                }
                if tier.short_window_secs == 0 || tier.long_window_secs == 0 {
                    return Err("tier windows must be greater than 0");
                }
            }
        }

        Ok(())
    }
}
