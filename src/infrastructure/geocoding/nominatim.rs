use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::Deserialize;
use tracing::warn;

use super::ReverseGeocoder;
use crate::config::GeocodingConfig;
use crate::domain::GeoPoint;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Reverse geocoder speaking the Nominatim `/reverse` JSON protocol.
pub struct NominatimGeocoder {
    base_url: String,
    client: Client,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> AppResult<Self> {
        Self::with_timeout(&config.base_url, &config.user_agent, config.timeout())
    }

    pub fn with_timeout(base_url: &str, user_agent: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "geocoding base url not configured"
            )));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        Ok(Self { base_url, client })
    }

    pub(crate) fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }

    fn parse_response(body: ReverseResponse) -> Option<String> {
        if body.error.is_some() {
            return None;
        }
        body.display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, point: GeoPoint) -> AppResult<Option<String>> {
        let response = self
            .client
            .get(self.reverse_url())
            .header(ACCEPT, "application/json")
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "reverse geocoding request failed");
                AppError::ServiceUnavailable {
                    service: "geocoding".to_string(),
                    message: "Reverse geocoding is temporarily unavailable.".to_string(),
                }
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "reverse geocoding returned an error status");
            return Err(AppError::ServiceUnavailable {
                service: "geocoding".to_string(),
                message: "Reverse geocoding is temporarily unavailable.".to_string(),
            });
        }

        let body = response.json::<ReverseResponse>().await.map_err(|e| {
            warn!(error = %e, "failed to parse reverse geocoding response");
            AppError::InternalError(anyhow::anyhow!("invalid geocoding response: {e}"))
        })?;

        Ok(Self::parse_response(body))
    }
}
