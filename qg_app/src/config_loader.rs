use std::path::Path;

use config::Config;
use config::ConfigError;
use config::File;
use qg_limiter::CredentialConfig;
use qg_limiter::GateConfig;
use qg_limiter::TierConfig;

pub fn load_gate_config<P: AsRef<Path>>(path: P) -> Result<GateConfig, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

    config.try_deserialize()
}

/// Load gate config with fallback to the built-in demo pool
pub fn load_gate_config_or_demo(path: &str) -> GateConfig {
    match load_gate_config(path) {
        Ok(config) => {
            tracing::info!("Loaded gate config from {path}");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to load gate config from {}: {}. Using demo pool.", path, err);
            demo_gate_config()
        }
    }
}

/// Two demo credentials with a flash/deep tier ladder each
///
/// Enough headroom for a short synthetic drill without touching real limits.
pub fn demo_gate_config() -> GateConfig {
    let ladder = || {
        vec![
            TierConfig { name: "flash".into(), short_ceiling: 20, short_window_secs: 60, long_ceiling: 500, long_window_secs: 86_400 },
            TierConfig { name: "deep".into(), short_ceiling: 60, short_window_secs: 60, long_ceiling: 2_000, long_window_secs: 86_400 },
        ]
    };

    GateConfig {
        credentials: vec![
            CredentialConfig { id: "demo-a".into(), secret: "sk-demo-a".into(), tiers: ladder() },
            CredentialConfig { id: "demo-b".into(), secret: "sk-demo-b".into(), tiers: ladder() },
        ],
        default_block_sizes: [("drill".to_string(), 5)].into_iter().collect(),
        ..GateConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const GATE_TOML: &str = r#"
        dead_health_threshold = 25.0
        health_recovery_secs = 120
        stagger_interval_ms = 100

        [default_block_sizes]
        scanner = 25
        reporter = 5

        [[credentials]]
        id = "key-1"
        secret = "sk-aaa"

        [[credentials.tiers]]
        name = "flash"
        short_ceiling = 10
        short_window_secs = 60
        long_ceiling = 250
        long_window_secs = 86400
    "#;

    #[test]
    fn test_parse_gate_toml() {
        let config: GateConfig =
            Config::builder().add_source(File::from_str(GATE_TOML, FileFormat::Toml)).build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.dead_health_threshold, 25.0);
        assert_eq!(config.stagger_interval_ms, 100);
        assert_eq!(config.default_block_sizes["scanner"], 25);
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.credentials[0].tiers[0].name, "flash");
        assert_eq!(config.credentials[0].tiers[0].long_ceiling, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_globals_take_defaults() {
        let minimal = r#"
            [[credentials]]
            id = "key-1"
            secret = "sk-aaa"

            [[credentials.tiers]]
            name = "flash"
            short_ceiling = 10
            short_window_secs = 60
            long_ceiling = 250
            long_window_secs = 86400
        "#;

        let config: GateConfig =
            Config::builder().add_source(File::from_str(minimal, FileFormat::Toml)).build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.dead_health_threshold, 30.0);
        assert_eq!(config.health_recovery_secs, 300);
    }

    #[test]
    fn test_demo_pool_is_valid() {
        let config = demo_gate_config();

        assert!(config.validate().is_ok());
        assert_eq!(config.credentials.len(), 2);
    }
}
