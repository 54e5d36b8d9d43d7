use std::time::Duration;

use serde::Deserialize;

use crate::config::defaults;

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "defaults::default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "defaults::default_max_radius_km")]
    pub max_radius_km: f64,
    #[serde(default = "defaults::default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "defaults::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "defaults::default_max_claim_attempts")]
    pub max_claim_attempts: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_radius_km: defaults::default_radius_km(),
            max_radius_km: defaults::default_max_radius_km(),
            store_timeout_ms: defaults::default_store_timeout_ms(),
            poll_interval_secs: defaults::default_poll_interval_secs(),
            max_claim_attempts: defaults::default_max_claim_attempts(),
        }
    }
}

impl MatchingConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
