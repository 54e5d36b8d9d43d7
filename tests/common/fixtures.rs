#![allow(dead_code)]

use atm_match::api::dtos::{CreateCashRequest, LocationInput};
use atm_match::domain::{CashRequest, NewCashRequest, RequestKind};
use atm_match::infrastructure::repositories::RequestRepository;
use rust_decimal::Decimal;

/// RK Beach, Visakhapatnam.
pub const ORIGIN: (f64, f64) = (17.6667, 82.6167);
/// Roughly half a kilometre north-east of `ORIGIN`.
pub const NEARBY: (f64, f64) = (17.6700, 82.6200);
/// Latitude offset of about one kilometre.
pub const ONE_KM_LAT: f64 = 0.009;

pub fn pending_request(
    kind: RequestKind,
    amount: i64,
    requester: &str,
    (lat, lng): (f64, f64),
) -> CashRequest {
    NewCashRequest::new(kind, Some(Decimal::new(amount, 0)), requester, lat, lng)
        .expect("fixture request should be valid")
        .into_request(format!("{lat:.4}, {lng:.4}"))
}

pub async fn seed(
    repo: &dyn RequestRepository,
    kind: RequestKind,
    amount: i64,
    requester: &str,
    at: (f64, f64),
) -> CashRequest {
    repo.insert(&pending_request(kind, amount, requester, at))
        .await
        .expect("seed insert should succeed")
}

pub fn create_payload(kind: RequestKind, amount: i64, (lat, lng): (f64, f64)) -> CreateCashRequest {
    CreateCashRequest {
        kind,
        amount: Some(Decimal::new(amount, 0)),
        location: LocationInput {
            lat,
            lng,
            address: None,
        },
    }
}
