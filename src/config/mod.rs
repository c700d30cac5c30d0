//! Configuration loading and management

mod io;
mod settings;

pub use settings::{
    DatabaseSettings, EconomySettings, GateSettings, GeneratorKind, GeneratorSettings,
    ServerSettings,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure (~/.kidbank/config.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database location
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Ledger and hint pricing
    #[serde(default)]
    pub economy: EconomySettings,

    /// Parental gate lockout policy
    #[serde(default)]
    pub gate: GateSettings,

    /// Daily riddle generator
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Local control API
    #[serde(default)]
    pub server: ServerSettings,
}

impl Config {
    /// Resolve the database path, falling back to ~/.kidbank/economy.db
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("economy.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.economy.hint_cost, 5);
        assert_eq!(config.gate.max_attempts, 3);
        assert_eq!(config.gate.lockout_secs, 300);
        assert_eq!(config.generator.kind, GeneratorKind::Bank);
        assert!(config.server.auth_token.is_empty());
    }

    #[test]
    fn test_partial_toml_uses_field_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gate]
            max_attempts = 5

            [generator]
            kind = "http"
            endpoint = "http://127.0.0.1:8080/riddle"
            "#,
        )
        .unwrap();

        assert_eq!(config.gate.max_attempts, 5);
        assert_eq!(config.gate.lockout_secs, 300);
        assert_eq!(config.generator.kind, GeneratorKind::Http);
        assert_eq!(config.generator.timeout_secs, 20);
        assert_eq!(config.economy.hint_cost, 5);
    }

    #[test]
    fn test_db_path_override() {
        let mut config = Config::default();
        assert!(config.db_path().ends_with("economy.db"));

        config.database.path = Some(PathBuf::from("/tmp/kids.db"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/kids.db"));
    }
}
