use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    #[serde(default = "crate::config::defaults::default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    /// Restricts `/metrics` to loopback and private-network peers.
    #[serde(default)]
    pub metrics_allow_private_only: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: crate::config::defaults::default_cors_allowed_origins(),
            metrics_allow_private_only: false,
        }
    }
}
