use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{CashRequest, Location, RequestKind, RequestStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must be between -180 and 180"
    ))]
    pub lng: f64,
    #[validate(length(max = 512, message = "address must be at most 512 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCashRequest {
    pub kind: RequestKind,
    /// Missing amounts are rejected by domain validation with a clear message.
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[validate(nested)]
    pub location: LocationInput,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub kind: Option<RequestKind>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CashRequestResponse {
    pub id: Uuid,
    pub kind: RequestKind,
    pub amount: Decimal,
    pub requester_id: String,
    pub requester_name: Option<String>,
    pub location: Location,
    pub status: RequestStatus,
    pub matched_with: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CashRequest> for CashRequestResponse {
    fn from(request: CashRequest) -> Self {
        Self {
            id: request.id,
            kind: request.kind,
            amount: request.amount,
            requester_id: request.requester_id,
            requester_name: request.requester_name,
            location: request.location,
            status: request.status,
            matched_with: request.matched_with,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}
