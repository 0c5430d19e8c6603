use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::MaterializationConfig;

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "tempo.toml";

/// Prefix of environment overrides, e.g. `TEMPO_DATABASE_URL` or
/// `TEMPO_MATERIALIZATION__LOOKAHEAD_DAYS`
pub const ENV_PREFIX: &str = "TEMPO_";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// SQLite file path or URL
    pub database_url: String,
    pub max_connections: u32,
    /// How long a store call may wait for a pooled connection
    pub acquire_timeout_secs: u64,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    pub materialization: MaterializationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "tempo.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            log_filter: "info".to_string(),
            materialization: MaterializationConfig::default(),
        }
    }
}

impl Config {
    /// Loads `tempo.toml` from the working directory, then environment overrides.
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment(CONFIG_FILE).extract()
    }

    /// Loads the given TOML file, then environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::new()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.materialization.lookahead_days, 30);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                database_url = "data/tasks.db"
                log_filter = "tempo_core=debug"

                [materialization]
                lookahead_days = 14
                "#,
            )?;
            jail.set_env("TEMPO_MAX_CONNECTIONS", "2");
            jail.set_env("TEMPO_MATERIALIZATION__MAX_BATCH_SIZE", "50");

            let config = Config::new()?;
            assert_eq!(config.database_url, "data/tasks.db");
            assert_eq!(config.log_filter, "tempo_core=debug");
            assert_eq!(config.max_connections, 2);
            assert_eq!(config.acquire_timeout_secs, 30);
            assert_eq!(config.materialization.lookahead_days, 14);
            assert_eq!(config.materialization.materialization_grace_days, 3);
            assert_eq!(config.materialization.max_batch_size, 50);
            Ok(())
        });
    }

    #[test]
    fn test_from_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "acquire_timeout_secs = 5")?;
            let config = Config::from_file("custom.toml")?;
            assert_eq!(config.acquire_timeout_secs, 5);
            assert_eq!(config.database_url, "tempo.db");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_reported() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "max_connections = \"many\"")?;
            assert!(Config::new().is_err());
            Ok(())
        });
    }
}
