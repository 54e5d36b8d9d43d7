mod nominatim;

use async_trait::async_trait;

use crate::domain::GeoPoint;
use crate::error::AppResult;

pub use nominatim::NominatimGeocoder;

/// Maps coordinates to a human-readable address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` means the lookup ran but found nothing usable.
    async fn reverse(&self, point: GeoPoint) -> AppResult<Option<String>>;
}

/// Geocoder used when no lookup service is configured; callers fall back
/// to raw coordinates.
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _point: GeoPoint) -> AppResult<Option<String>> {
        Ok(None)
    }
}
