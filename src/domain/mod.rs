pub mod errors;
pub mod geo;
pub mod request;

pub use errors::DomainError;
pub use geo::{haversine_km, GeoPoint, EARTH_RADIUS_KM};
pub use request::{
    validate_amount, CashRequest, Location, NewCashRequest, RequestKind, RequestStatus,
    RetireReason,
};
