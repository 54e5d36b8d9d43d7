use std::time::Duration;

use serde::Deserialize;

use crate::config::defaults;

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "defaults::default_geocoding_base_url")]
    pub base_url: String,
    #[serde(default = "defaults::default_geocoding_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "defaults::default_geocoding_user_agent")]
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: defaults::default_geocoding_base_url(),
            timeout_ms: defaults::default_geocoding_timeout_ms(),
            user_agent: defaults::default_geocoding_user_agent(),
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
