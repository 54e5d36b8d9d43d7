use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::events::{NoopNotifier, QueueEvent, QueueNotifier};
use super::with_store_timeout;
use crate::config::MatchingConfig;
use crate::domain::{
    validate_amount, CashRequest, DomainError, GeoPoint, RequestKind, RequestStatus,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::RequestRepository;
use crate::observability::AppMetrics;

/// Two requests retired together, seen from the side that asked for the match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub request: CashRequest,
    pub counterparty: CashRequest,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct NearbyRequest {
    pub request: CashRequest,
    pub distance_km: f64,
}

#[derive(Clone)]
pub struct MatchingService {
    request_repo: Arc<dyn RequestRepository>,
    notifier: Arc<dyn QueueNotifier>,
    metrics: Arc<AppMetrics>,
    store_timeout: Duration,
    default_radius_km: f64,
    max_radius_km: f64,
    max_claim_attempts: u32,
}

impl MatchingService {
    pub fn new(request_repo: Arc<dyn RequestRepository>, config: &MatchingConfig) -> Self {
        Self {
            request_repo,
            notifier: Arc::new(NoopNotifier),
            metrics: Arc::new(AppMetrics::default()),
            store_timeout: config.store_timeout(),
            default_radius_km: config.default_radius_km,
            max_radius_km: config.max_radius_km,
            max_claim_attempts: config.max_claim_attempts.max(1),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn QueueNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Oldest pending request of the opposite kind with exactly `amount`.
    pub async fn find_exact_match(
        &self,
        kind: RequestKind,
        amount: Option<Decimal>,
    ) -> AppResult<Option<CashRequest>> {
        let amount = validate_amount(amount)?;
        let candidates = self.pending_of(kind.opposite()).await?;

        Ok(candidates
            .into_iter()
            .find(|candidate| candidate.amount == amount))
    }

    /// Opposite-kind pending requests within `radius_km` of the origin,
    /// nearest first. Equal distances keep queue order.
    pub async fn find_nearby(
        &self,
        kind: RequestKind,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> AppResult<Vec<NearbyRequest>> {
        let origin = GeoPoint::new(lat, lng)?;
        let radius_km = self.resolve_radius(radius_km)?;
        let candidates = self.pending_of(kind.opposite()).await?;

        let mut nearby: Vec<NearbyRequest> = candidates
            .into_iter()
            .map(|request| {
                let distance_km = request.distance_km_to(&origin);
                NearbyRequest {
                    request,
                    distance_km,
                }
            })
            .filter(|candidate| candidate.distance_km <= radius_km)
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        Ok(nearby)
    }

    /// Pairs the caller's request with an explicitly chosen counter-party.
    pub async fn claim_match(
        &self,
        requester_id: &str,
        request_id: Uuid,
        counterparty_id: Uuid,
    ) -> AppResult<MatchedPair> {
        if request_id == counterparty_id {
            return Err(AppError::BadRequest(
                "a request cannot be matched with itself".to_string(),
            ));
        }

        let request = self.own_request(requester_id, request_id).await?;
        let counterparty = self
            .load(counterparty_id)
            .await?
            .ok_or_else(|| AppError::NotFound("counterparty request not found".to_string()))?;

        if let Err(error) = request.ensure_pairable(&counterparty) {
            if matches!(error, DomainError::Conflict(_)) {
                self.metrics.match_conflict();
            }
            return Err(error.into());
        }

        self.commit_pair(request.id, counterparty.id).await
    }

    /// Finds the oldest compatible counter-party for the caller's request and
    /// claims it. A lost race re-enters the search until the attempt budget
    /// runs out. A request someone else already paired yields that pair.
    pub async fn match_request(
        &self,
        requester_id: &str,
        request_id: Uuid,
    ) -> AppResult<Option<MatchedPair>> {
        let mut request = self.own_request(requester_id, request_id).await?;
        let mut attempt = 1;

        loop {
            match request.status {
                RequestStatus::Pending => {}
                RequestStatus::Matched => return self.existing_pair(request).await.map(Some),
                RequestStatus::Cancelled => {
                    return Err(AppError::BadRequest(
                        "request was cancelled and cannot be matched".to_string(),
                    ));
                }
            }

            let candidates = self.pending_of(request.kind.opposite()).await?;
            let Some(counterparty) = candidates
                .into_iter()
                .find(|candidate| request.can_pair_with(candidate))
            else {
                return Ok(None);
            };

            match self.commit_pair(request.id, counterparty.id).await {
                Ok(pair) => return Ok(Some(pair)),
                Err(AppError::Conflict(message)) if attempt < self.max_claim_attempts => {
                    warn!(
                        request_id = %request.id,
                        counterparty_id = %counterparty.id,
                        attempt,
                        "lost match race, searching again: {message}"
                    );
                    attempt += 1;
                    request = self.load(request_id).await?.ok_or_else(|| {
                        AppError::NotFound("request not found".to_string())
                    })?;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn commit_pair(&self, request_id: Uuid, counterparty_id: Uuid) -> AppResult<MatchedPair> {
        let result = with_store_timeout(
            self.store_timeout,
            self.request_repo.retire_pair(request_id, counterparty_id),
        )
        .await;

        let (request, counterparty) = match result {
            Ok(pair) => pair,
            Err(error) => {
                if matches!(error, AppError::Conflict(_)) {
                    self.metrics.match_conflict();
                }
                return Err(error);
            }
        };

        let distance_km = request
            .location
            .point()
            .distance_km(&counterparty.location.point());
        let pair = MatchedPair {
            request,
            counterparty,
            distance_km,
        };

        info!(
            request_id = %pair.request.id,
            counterparty_id = %pair.counterparty.id,
            kind = %pair.request.kind,
            amount = %pair.request.amount,
            distance_km = pair.distance_km,
            "requests matched"
        );
        self.metrics.match_completed();

        self.notifier.publish(&QueueEvent::MatchFound(pair.clone()));
        for id in [pair.request.id, pair.counterparty.id] {
            self.notifier.publish(&QueueEvent::RequestRetired {
                id,
                status: RequestStatus::Matched,
            });
        }

        Ok(pair)
    }

    async fn existing_pair(&self, request: CashRequest) -> AppResult<MatchedPair> {
        let counterparty = match request.matched_with {
            Some(counterparty_id) => self.load(counterparty_id).await?,
            None => None,
        }
        .ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "matched request {} has no counter-party",
                request.id
            ))
        })?;

        info!(
            request_id = %request.id,
            counterparty_id = %counterparty.id,
            status = %request.status,
            "request was already matched"
        );
        let distance_km = request
            .location
            .point()
            .distance_km(&counterparty.location.point());
        Ok(MatchedPair {
            request,
            counterparty,
            distance_km,
        })
    }

    async fn own_request(&self, requester_id: &str, id: Uuid) -> AppResult<CashRequest> {
        let request = self
            .load(id)
            .await?
            .ok_or_else(|| AppError::NotFound("request not found".to_string()))?;

        if request.requester_id != requester_id {
            return Err(AppError::Forbidden(
                "You can only match your own requests".to_string(),
            ));
        }
        Ok(request)
    }

    async fn load(&self, id: Uuid) -> AppResult<Option<CashRequest>> {
        with_store_timeout(self.store_timeout, self.request_repo.find_by_id(id)).await
    }

    async fn pending_of(&self, kind: RequestKind) -> AppResult<Vec<CashRequest>> {
        with_store_timeout(self.store_timeout, self.request_repo.list_pending(Some(kind))).await
    }

    fn resolve_radius(&self, radius_km: Option<f64>) -> AppResult<f64> {
        let radius_km = radius_km.unwrap_or(self.default_radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AppError::validation_error(
                "radius_km must be a positive number",
            ));
        }
        if radius_km > self.max_radius_km {
            return Err(AppError::validation_error(format!(
                "radius_km must be at most {}",
                self.max_radius_km
            )));
        }
        Ok(radius_km)
    }
}
