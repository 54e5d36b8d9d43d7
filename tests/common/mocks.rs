#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use atm_match::application::{QueueEvent, QueueNotifier};
use atm_match::domain::{CashRequest, GeoPoint, RequestKind, RetireReason};
use atm_match::error::{AppError, AppResult};
use atm_match::infrastructure::geocoding::ReverseGeocoder;
use atm_match::infrastructure::repositories::{InMemoryRequestRepository, RequestRepository};
use uuid::Uuid;

/// Store whose backend is down.
pub struct FailingRequestRepo;

#[async_trait]
impl RequestRepository for FailingRequestRepo {
    async fn insert(&self, _request: &CashRequest) -> AppResult<CashRequest> {
        Err(AppError::store_unavailable("connection refused"))
    }

    async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<CashRequest>> {
        Err(AppError::store_unavailable("connection refused"))
    }

    async fn list_pending(&self, _kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>> {
        Err(AppError::store_unavailable("connection refused"))
    }

    async fn retire(&self, _id: Uuid, _reason: RetireReason) -> AppResult<bool> {
        Err(AppError::store_unavailable("connection refused"))
    }

    async fn retire_pair(
        &self,
        _first: Uuid,
        _second: Uuid,
    ) -> AppResult<(CashRequest, CashRequest)> {
        Err(AppError::store_unavailable("connection refused"))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::store_unavailable("connection refused"))
    }
}

/// In-memory store whose reads and pings stall for `delay`.
pub struct SlowRequestRepo {
    pub inner: InMemoryRequestRepository,
    pub delay: Duration,
}

impl SlowRequestRepo {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryRequestRepository::new(),
            delay,
        }
    }
}

#[async_trait]
impl RequestRepository for SlowRequestRepo {
    async fn insert(&self, request: &CashRequest) -> AppResult<CashRequest> {
        self.inner.insert(request).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CashRequest>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_pending(kind).await
    }

    async fn retire(&self, id: Uuid, reason: RetireReason) -> AppResult<bool> {
        self.inner.retire(id, reason).await
    }

    async fn retire_pair(&self, first: Uuid, second: Uuid) -> AppResult<(CashRequest, CashRequest)> {
        self.inner.retire_pair(first, second).await
    }

    async fn ping(&self) -> AppResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.ping().await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<QueueEvent>>,
}

impl RecordingNotifier {
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events mutex poisoned")
            .iter()
            .map(|event| {
                serde_json::to_value(event).expect("event serializes")["type"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}

impl QueueNotifier for RecordingNotifier {
    fn publish(&self, event: &QueueEvent) {
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(event.clone());
    }
}

pub struct FixedGeocoder(pub &'static str);

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn reverse(&self, _point: GeoPoint) -> AppResult<Option<String>> {
        Ok(Some(self.0.to_string()))
    }
}

pub struct FailingGeocoder;

#[async_trait]
impl ReverseGeocoder for FailingGeocoder {
    async fn reverse(&self, _point: GeoPoint) -> AppResult<Option<String>> {
        Err(AppError::ServiceUnavailable {
            service: "geocoding".to_string(),
            message: "down".to_string(),
        })
    }
}
