use serde::Deserialize;

use crate::config::defaults;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "defaults::default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "defaults::default_db_min_connections")]
    pub min_connections: u32,
    #[serde(default = "defaults::default_db_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: defaults::default_db_max_connections(),
            min_connections: defaults::default_db_min_connections(),
            acquire_timeout_seconds: defaults::default_db_acquire_timeout_seconds(),
        }
    }
}

/// Which implementation backs the shared request queue.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}
