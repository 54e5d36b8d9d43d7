pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_environment() -> String {
    "development".to_string()
}

pub fn default_db_max_connections() -> u32 {
    10
}

pub fn default_db_min_connections() -> u32 {
    1
}

pub fn default_db_acquire_timeout_seconds() -> u64 {
    10
}

pub fn default_radius_km() -> f64 {
    3.0
}

pub fn default_max_radius_km() -> f64 {
    50.0
}

pub fn default_store_timeout_ms() -> u64 {
    5_000
}

pub fn default_poll_interval_secs() -> u64 {
    5
}

pub fn default_max_claim_attempts() -> u32 {
    3
}

pub fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

pub fn default_geocoding_timeout_ms() -> u64 {
    3_000
}

pub fn default_geocoding_user_agent() -> String {
    concat!("atm-match-backend/", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn default_cors_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

pub fn default_logging_level() -> String {
    "info".to_string()
}

pub fn default_logging_json_format() -> bool {
    true
}

pub fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
