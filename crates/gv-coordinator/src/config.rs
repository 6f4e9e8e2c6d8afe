//! Coordinator configuration (spec §6): the enumerated field set, loaded
//! from environment variables (and whatever `.env` file
//! `gv-coordinator-server` loads before calling here), the way the
//! teacher's `engine::settings::Settings` layers the `config` crate over
//! environment-sourced values.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_signing_round_timeout_seconds() -> u64 {
    300
}

fn default_transaction_timeout_seconds() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    pub mongodb_url: Option<String>,
    pub mongodb_db_name: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    pub secret_key: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_signing_round_timeout_seconds")]
    pub signing_round_timeout_seconds: u64,
    #[serde(default = "default_transaction_timeout_seconds")]
    pub transaction_timeout_seconds: u64,
}

impl CoordinatorConfig {
    /// Loads configuration from process environment variables
    /// (case-insensitive, e.g. `GV_PORT`, `GV_SECRET_KEY`), the only
    /// global state this workspace keeps (spec §6, §9 "re-architecting
    /// global state" — no hidden singletons, this value is constructed
    /// once at startup and threaded through `CoordinatorContext`).
    pub fn load() -> Result<Self, ConfigError> {
        let built = Config::builder()
            .add_source(Environment::with_prefix("GV").separator("__"))
            .build()?;
        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_required_secret_key_from_env() {
        std::env::set_var("GV_SECRET_KEY", "test-secret");
        std::env::set_var("GV_PORT", "9000");
        let config = CoordinatorConfig::load().unwrap();
        assert_eq!(config.secret_key, "test-secret");
        assert_eq!(config.port, 9000);
        assert_eq!(config.signing_round_timeout_seconds, 300);
        std::env::remove_var("GV_SECRET_KEY");
        std::env::remove_var("GV_PORT");
    }
}
