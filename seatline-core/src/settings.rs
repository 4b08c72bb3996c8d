use serde::Deserialize;
use std::time::Duration;

/// Tuning for the inventory manager's locking and store access
#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

fn default_store_timeout_ms() -> u64 { 3000 }
fn default_lock_timeout_ms() -> u64 { 5000 }
fn default_max_conflict_retries() -> u32 { 3 }

impl InventoryConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}
