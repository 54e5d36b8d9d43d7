use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::events::{NoopNotifier, QueueEvent, QueueNotifier};
use super::with_store_timeout;
use crate::api::dtos::CreateCashRequest;
use crate::domain::{CashRequest, GeoPoint, NewCashRequest, RequestKind, RetireReason};
use crate::error::{AppError, AppResult};
use crate::infrastructure::geocoding::{DisabledGeocoder, ReverseGeocoder};
use crate::infrastructure::repositories::RequestRepository;
use crate::observability::AppMetrics;

#[derive(Clone)]
pub struct RequestService {
    request_repo: Arc<dyn RequestRepository>,
    geocoder: Arc<dyn ReverseGeocoder>,
    notifier: Arc<dyn QueueNotifier>,
    metrics: Arc<AppMetrics>,
    store_timeout: Duration,
}

impl RequestService {
    pub fn new(request_repo: Arc<dyn RequestRepository>, store_timeout: Duration) -> Self {
        Self {
            request_repo,
            geocoder: Arc::new(DisabledGeocoder),
            notifier: Arc::new(NoopNotifier),
            metrics: Arc::new(AppMetrics::default()),
            store_timeout,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn QueueNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validates and enqueues a new withdrawal/deposit intent.
    pub async fn submit(
        &self,
        requester_id: &str,
        requester_name: Option<String>,
        request: CreateCashRequest,
    ) -> AppResult<CashRequest> {
        request.validate()?;

        let new_request = NewCashRequest::new(
            request.kind,
            request.amount,
            requester_id,
            request.location.lat,
            request.location.lng,
        )?
        .with_requester_name(requester_name)
        .with_address(request.location.address)?;

        let address = self
            .resolve_address(new_request.point, new_request.address.clone())
            .await;
        let entry = new_request.into_request(address);

        let created = with_store_timeout(self.store_timeout, self.request_repo.insert(&entry)).await?;

        info!(
            request_id = %created.id,
            kind = %created.kind,
            amount = %created.amount,
            requester_id = %created.requester_id,
            "cash request queued"
        );
        self.metrics.request_created();
        self.notifier
            .publish(&QueueEvent::RequestCreated(created.clone()));

        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<CashRequest> {
        with_store_timeout(self.store_timeout, self.request_repo.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound("request not found".to_string()))
    }

    pub async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>> {
        with_store_timeout(self.store_timeout, self.request_repo.list_pending(kind)).await
    }

    /// Withdraws the caller's own intent. Unknown or already retired
    /// requests are left alone and reported as `false`.
    pub async fn cancel(&self, requester_id: &str, id: Uuid) -> AppResult<bool> {
        let Some(existing) =
            with_store_timeout(self.store_timeout, self.request_repo.find_by_id(id)).await?
        else {
            return Ok(false);
        };

        if existing.requester_id != requester_id {
            return Err(AppError::Forbidden(
                "You can only cancel your own requests".to_string(),
            ));
        }

        self.retire(id, RetireReason::Cancelled).await
    }

    pub async fn retire(&self, id: Uuid, reason: RetireReason) -> AppResult<bool> {
        let retired =
            with_store_timeout(self.store_timeout, self.request_repo.retire(id, reason)).await?;

        if retired {
            info!(request_id = %id, reason = ?reason, "cash request retired");
            self.notifier.publish(&QueueEvent::RequestRetired {
                id,
                status: reason.target_status(),
            });
        }

        Ok(retired)
    }

    /// Readiness probe against the backing store, bounded like every other call.
    pub async fn ping(&self) -> AppResult<()> {
        with_store_timeout(self.store_timeout, self.request_repo.ping()).await
    }

    async fn resolve_address(&self, point: GeoPoint, supplied: Option<String>) -> String {
        if let Some(address) = supplied {
            return address;
        }

        match self.geocoder.reverse(point).await {
            Ok(Some(address)) => address,
            Ok(None) => point.fallback_address(),
            Err(error) => {
                warn!(error = %error, lat = point.lat, lng = point.lng, "falling back to raw coordinates");
                point.fallback_address()
            }
        }
    }
}
