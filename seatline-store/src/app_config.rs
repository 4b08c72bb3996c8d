use seatline_core::InventoryConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_ms() -> u64 { 3000 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Uncommitted developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SEATLINE_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SEATLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_inventory_defaults_apply() {
        let s = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [database]
                url = "postgres://localhost/seatline"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: Config = s.try_deserialize().unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.inventory.store_timeout_ms, 3000);
        assert_eq!(config.inventory.max_conflict_retries, 3);
    }

    #[test]
    fn test_inventory_overrides() {
        let s = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [database]
                url = "postgres://localhost/seatline"

                [inventory]
                store_timeout_ms = 250
                lock_timeout_ms = 500
                max_conflict_retries = 1
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: Config = s.try_deserialize().unwrap();
        assert_eq!(config.inventory.store_timeout().as_millis(), 250);
        assert_eq!(config.inventory.lock_timeout().as_millis(), 500);
        assert_eq!(config.inventory.max_conflict_retries, 1);
    }
}
