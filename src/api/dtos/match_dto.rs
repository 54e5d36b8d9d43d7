use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request_dto::CashRequestResponse;
use crate::application::{MatchedPair, NearbyRequest};
use crate::domain::RequestKind;

#[derive(Debug, Deserialize)]
pub struct ExactMatchQuery {
    pub kind: RequestKind,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub kind: RequestKind,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimMatchRequest {
    pub request_id: Uuid,
    pub counterparty_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ExactMatchResponse {
    pub request: Option<CashRequestResponse>,
}

#[derive(Debug, Serialize)]
pub struct NearbyRequestResponse {
    #[serde(flatten)]
    pub request: CashRequestResponse,
    pub distance_km: f64,
}

impl From<NearbyRequest> for NearbyRequestResponse {
    fn from(nearby: NearbyRequest) -> Self {
        Self {
            request: nearby.request.into(),
            distance_km: nearby.distance_km,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub request: CashRequestResponse,
    pub counterparty: CashRequestResponse,
    pub distance_km: f64,
}

impl From<MatchedPair> for MatchResponse {
    fn from(pair: MatchedPair) -> Self {
        Self {
            request: pair.request.into(),
            counterparty: pair.counterparty.into(),
            distance_km: pair.distance_km,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchAttemptResponse {
    pub matched: bool,
    #[serde(rename = "match")]
    pub result: Option<MatchResponse>,
}
