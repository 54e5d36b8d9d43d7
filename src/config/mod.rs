pub mod database_config;
pub mod defaults;
pub mod geocoding_config;
pub mod matching_config;
pub mod security_config;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

pub use database_config::{DatabaseConfig, StoreBackend, StoreConfig};
pub use geocoding_config::GeocodingConfig;
pub use matching_config::MatchingConfig;
pub use security_config::SecurityConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid matching configuration: {0}")]
    Matching(String),

    #[error("Invalid store configuration: {0}")]
    Store(String),

    #[error("Invalid geocoding configuration: {0}")]
    Geocoding(String),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "defaults::default_host")]
    pub host: String,
    #[serde(default = "defaults::default_port")]
    pub port: u16,
    #[serde(default = "defaults::default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::default_host(),
            port: defaults::default_port(),
            environment: defaults::default_environment(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_logging_level")]
    pub level: String,
    #[serde(default = "defaults::default_logging_json_format")]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_logging_level(),
            json_format: defaults::default_logging_json_format(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<figment::Error>> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Toml::file("config/development.toml").nested()),
        )
    }

    /// Applies the environment layers on top of `base` and extracts.
    pub fn from_figment(base: Figment) -> Result<Self, Box<figment::Error>> {
        let mut config: Self = base
            .merge(Env::prefixed("ATM_").split("__"))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
            .extract()
            .map_err(Box::new)?;

        config.database.url =
            defaults::normalize_optional_string(Some(config.database.url)).unwrap_or_default();

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let matching = &self.matching;
        if !(matching.default_radius_km.is_finite() && matching.default_radius_km > 0.0) {
            return Err(ConfigError::Matching(
                "default_radius_km must be a positive number".to_string(),
            ));
        }
        if !matching.max_radius_km.is_finite() || matching.max_radius_km < matching.default_radius_km
        {
            return Err(ConfigError::Matching(
                "max_radius_km must be at least default_radius_km".to_string(),
            ));
        }
        if matching.store_timeout_ms == 0 {
            return Err(ConfigError::Matching(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if matching.poll_interval_secs == 0 {
            return Err(ConfigError::Matching(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if matching.max_claim_attempts == 0 {
            return Err(ConfigError::Matching(
                "max_claim_attempts must be greater than zero".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Store(
                "DATABASE_URL is required when the postgres store is selected".to_string(),
            ));
        }

        if self.geocoding.enabled && self.geocoding.base_url.trim().is_empty() {
            return Err(ConfigError::Geocoding(
                "base_url is required when geocoding is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn default_config_uses_three_kilometre_radius() {
        let config = AppConfig::default();

        assert_eq!(config.matching.default_radius_km, 3.0);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn validate_rejects_non_positive_radius() {
        let mut config = AppConfig::default();
        config.matching.default_radius_km = 0.0;

        assert!(matches!(config.validate(), Err(ConfigError::Matching(_))));
    }

    #[test]
    fn validate_rejects_max_radius_below_default() {
        let mut config = AppConfig::default();
        config.matching.max_radius_km = 1.0;

        assert_eq!(
            config.validate(),
            Err(ConfigError::Matching(
                "max_radius_km must be at least default_radius_km".to_string()
            ))
        );
    }

    #[test]
    fn validate_rejects_zero_timeouts_and_attempts() {
        let mut config = AppConfig::default();
        config.matching.store_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.matching.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.matching.max_claim_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_database_url_for_postgres_backend() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Postgres;

        assert!(matches!(config.validate(), Err(ConfigError::Store(_))));

        config.database.url = "postgres://localhost/atm".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_figment_reads_nested_sections() {
        let figment = figment::Figment::new().merge(Toml::string(
            r#"
            [store]
            backend = "postgres"

            [matching]
            max_claim_attempts = 7
            "#,
        ));

        let config = AppConfig::from_figment(figment).expect("config should extract");

        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.matching.max_claim_attempts, 7);
        assert_eq!(config.matching.default_radius_km, 3.0);
    }
}
