use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::errors::DomainError;
use super::geo::GeoPoint;

const MAX_AMOUNT_SCALE: u32 = 2;
const MAX_AMOUNT_INTEGER_DIGITS: usize = 12;
const MAX_REQUESTER_ID_LEN: usize = 128;
const MAX_ADDRESS_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Withdrawal,
    Deposit,
}

impl RequestKind {
    /// The kind a counter-party must have to pair with this one.
    pub const fn opposite(self) -> Self {
        match self {
            RequestKind::Withdrawal => RequestKind::Deposit,
            RequestKind::Deposit => RequestKind::Withdrawal,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestKind::Withdrawal => "withdrawal",
            RequestKind::Deposit => "deposit",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Matched,
    Cancelled,
}

impl RequestStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Matched => "matched",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pending request leaves the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetireReason {
    Matched,
    Cancelled,
}

impl RetireReason {
    pub const fn target_status(self) -> RequestStatus {
        match self {
            RetireReason::Matched => RequestStatus::Matched,
            RetireReason::Cancelled => RequestStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    #[sqlx(rename = "latitude")]
    pub lat: f64,
    #[sqlx(rename = "longitude")]
    pub lng: f64,
    pub address: String,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// A user's standing intent to withdraw or deposit cash at a location.
///
/// `kind` and `amount` never change after creation; only the status and its
/// bookkeeping fields move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CashRequest {
    pub id: Uuid,
    pub kind: RequestKind,
    pub amount: Decimal,
    pub requester_id: String,
    pub requester_name: Option<String>,
    #[sqlx(flatten)]
    pub location: Location,
    pub status: RequestStatus,
    pub matched_with: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CashRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// True when `other` is a valid counter-party for `self`.
    pub fn can_pair_with(&self, other: &CashRequest) -> bool {
        self.ensure_pairable(other).is_ok()
    }

    /// Explains why `other` cannot be paired with `self`. A retired side is a
    /// conflict; any other mismatch breaks the pairing rule.
    pub fn ensure_pairable(&self, other: &CashRequest) -> Result<(), DomainError> {
        if self.id == other.id {
            return Err(DomainError::BusinessRuleViolation(
                "a request cannot be matched with itself".to_string(),
            ));
        }
        if !self.is_pending() || !other.is_pending() {
            return Err(DomainError::Conflict(
                "one of the requests is no longer pending".to_string(),
            ));
        }
        if self.kind.opposite() != other.kind
            || self.amount != other.amount
            || self.requester_id == other.requester_id
        {
            return Err(DomainError::BusinessRuleViolation(
                "requests must be of opposite kinds, equal amounts and different requesters"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn distance_km_to(&self, point: &GeoPoint) -> f64 {
        self.location.point().distance_km(point)
    }

    /// Moves a pending request into a terminal status. Returns false and
    /// leaves the request untouched when it was already retired.
    pub fn retire(&mut self, reason: RetireReason, counterparty: Option<Uuid>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = reason.target_status();
        if reason == RetireReason::Matched {
            self.matched_with = counterparty;
        }
        self.updated_at = Utc::now();
        true
    }
}

/// Validated input for a new queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCashRequest {
    pub kind: RequestKind,
    pub amount: Decimal,
    pub requester_id: String,
    pub requester_name: Option<String>,
    pub point: GeoPoint,
    pub address: Option<String>,
}

impl NewCashRequest {
    pub fn new(
        kind: RequestKind,
        amount: Option<Decimal>,
        requester_id: impl Into<String>,
        lat: f64,
        lng: f64,
    ) -> Result<Self, DomainError> {
        let amount = validate_amount(amount)?;
        let requester_id = requester_id.into().trim().to_string();
        if requester_id.is_empty() {
            return Err(DomainError::ValidationError(
                "requester id is required".to_string(),
            ));
        }
        if requester_id.len() > MAX_REQUESTER_ID_LEN {
            return Err(DomainError::ValidationError(format!(
                "requester id must be at most {MAX_REQUESTER_ID_LEN} characters"
            )));
        }

        Ok(Self {
            kind,
            amount,
            requester_id,
            requester_name: None,
            point: GeoPoint::new(lat, lng)?,
            address: None,
        })
    }

    pub fn with_requester_name(mut self, name: Option<String>) -> Self {
        self.requester_name = name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_address(mut self, address: Option<String>) -> Result<Self, DomainError> {
        let address = address
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if address
            .as_ref()
            .is_some_and(|value| value.chars().count() > MAX_ADDRESS_LEN)
        {
            return Err(DomainError::ValidationError(format!(
                "address must be at most {MAX_ADDRESS_LEN} characters"
            )));
        }
        self.address = address;
        Ok(self)
    }

    /// Materializes the queue entry with a fresh id, the current time and a
    /// resolved address.
    pub fn into_request(self, resolved_address: String) -> CashRequest {
        let now = Utc::now();
        CashRequest {
            id: Uuid::new_v4(),
            kind: self.kind,
            amount: self.amount,
            requester_id: self.requester_id,
            requester_name: self.requester_name,
            location: Location {
                lat: self.point.lat,
                lng: self.point.lng,
                address: resolved_address,
            },
            status: RequestStatus::Pending,
            matched_with: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal, DomainError> {
    let amount =
        amount.ok_or_else(|| DomainError::ValidationError("amount is required".to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(DomainError::ValidationError(
            "amount must be greater than zero".to_string(),
        ));
    }
    let normalized = amount.normalize();
    if normalized.scale() > MAX_AMOUNT_SCALE {
        return Err(DomainError::ValidationError(format!(
            "amount must have at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if normalized.trunc().to_string().len() > MAX_AMOUNT_INTEGER_DIGITS {
        return Err(DomainError::ValidationError(
            "amount is too large".to_string(),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(kind: RequestKind, amount: i64, requester: &str) -> CashRequest {
        NewCashRequest::new(kind, Some(Decimal::new(amount, 0)), requester, 17.6667, 82.6167)
            .expect("valid request")
            .into_request("Visakhapatnam".to_string())
    }

    #[test]
    fn kind_opposite_flips_both_ways() {
        assert_eq!(RequestKind::Withdrawal.opposite(), RequestKind::Deposit);
        assert_eq!(RequestKind::Deposit.opposite(), RequestKind::Withdrawal);
    }

    #[test]
    fn kind_serializes_to_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestKind::Withdrawal).unwrap(),
            "\"withdrawal\""
        );
        assert_eq!(
            serde_json::from_str::<RequestKind>("\"deposit\"").unwrap(),
            RequestKind::Deposit
        );
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Matched.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn new_request_rejects_missing_amount() {
        let result = NewCashRequest::new(RequestKind::Deposit, None, "alice", 0.0, 0.0);
        assert_eq!(
            result,
            Err(DomainError::ValidationError("amount is required".to_string()))
        );
    }

    #[test]
    fn new_request_rejects_non_positive_amount() {
        for amount in [Decimal::ZERO, Decimal::new(-500, 0)] {
            let result = NewCashRequest::new(RequestKind::Deposit, Some(amount), "alice", 0.0, 0.0);
            assert!(matches!(result, Err(DomainError::ValidationError(_))));
        }
    }

    #[test]
    fn new_request_rejects_sub_cent_amounts() {
        let result = NewCashRequest::new(
            RequestKind::Deposit,
            Some(Decimal::new(1_001, 3)),
            "alice",
            0.0,
            0.0,
        );
        assert!(result.is_err());

        let trailing_zeros = NewCashRequest::new(
            RequestKind::Deposit,
            Some(Decimal::new(50_000, 3)),
            "alice",
            0.0,
            0.0,
        );
        assert!(trailing_zeros.is_ok());
    }

    #[test]
    fn new_request_rejects_blank_requester() {
        let result =
            NewCashRequest::new(RequestKind::Deposit, Some(Decimal::ONE), "   ", 0.0, 0.0);
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn new_request_rejects_bad_coordinates() {
        let result =
            NewCashRequest::new(RequestKind::Deposit, Some(Decimal::ONE), "alice", 91.0, 0.0);
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn into_request_starts_pending_with_fresh_identity() {
        let first = pending(RequestKind::Deposit, 500, "alice");
        let second = pending(RequestKind::Deposit, 500, "alice");

        assert_eq!(first.status, RequestStatus::Pending);
        assert!(first.matched_with.is_none());
        assert_eq!(first.location.address, "Visakhapatnam");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let request = NewCashRequest::new(RequestKind::Deposit, Some(Decimal::ONE), "a", 0.0, 0.0)
            .unwrap()
            .with_requester_name(Some("  ".to_string()))
            .with_address(Some(" ".to_string()))
            .unwrap();

        assert!(request.requester_name.is_none());
        assert!(request.address.is_none());
    }

    #[test]
    fn can_pair_with_requires_opposite_kind_equal_amount_and_other_owner() {
        let deposit = pending(RequestKind::Deposit, 500, "alice");
        let withdrawal = pending(RequestKind::Withdrawal, 500, "bob");
        let same_kind = pending(RequestKind::Deposit, 500, "bob");
        let other_amount = pending(RequestKind::Withdrawal, 1000, "bob");
        let same_owner = pending(RequestKind::Withdrawal, 500, "alice");

        assert!(deposit.can_pair_with(&withdrawal));
        assert!(withdrawal.can_pair_with(&deposit));
        assert!(!deposit.can_pair_with(&same_kind));
        assert!(!deposit.can_pair_with(&other_amount));
        assert!(!deposit.can_pair_with(&same_owner));
    }

    #[test]
    fn ensure_pairable_separates_conflicts_from_rule_violations() {
        let deposit = pending(RequestKind::Deposit, 500, "alice");
        let mut withdrawal = pending(RequestKind::Withdrawal, 500, "bob");
        let same_owner = pending(RequestKind::Withdrawal, 500, "alice");

        assert_eq!(deposit.ensure_pairable(&withdrawal), Ok(()));
        assert!(matches!(
            deposit.ensure_pairable(&deposit),
            Err(DomainError::BusinessRuleViolation(_))
        ));
        assert!(matches!(
            deposit.ensure_pairable(&same_owner),
            Err(DomainError::BusinessRuleViolation(_))
        ));

        withdrawal.retire(RetireReason::Cancelled, None);
        assert!(matches!(
            deposit.ensure_pairable(&withdrawal),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn equal_amounts_compare_numerically() {
        let deposit = pending(RequestKind::Deposit, 500, "alice");
        let mut withdrawal = pending(RequestKind::Withdrawal, 500, "bob");
        withdrawal.amount = Decimal::new(50_000, 2);

        assert!(deposit.can_pair_with(&withdrawal));
    }

    #[test]
    fn retire_is_one_way() {
        let mut request = pending(RequestKind::Deposit, 500, "alice");
        let counterparty = Uuid::new_v4();

        assert!(request.retire(RetireReason::Matched, Some(counterparty)));
        assert_eq!(request.status, RequestStatus::Matched);
        assert_eq!(request.matched_with, Some(counterparty));

        assert!(!request.retire(RetireReason::Cancelled, None));
        assert_eq!(request.status, RequestStatus::Matched);
    }
}
