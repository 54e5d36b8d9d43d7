use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::traits::RequestRepository;
use crate::domain::{CashRequest, RequestKind, RetireReason};
use crate::error::{AppError, AppResult};

/// Process-local queue. Entries are never purged; retired requests stay in
/// place with a terminal status.
#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: RwLock<Vec<CashRequest>>,
}

impl InMemoryRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_requests(&self) -> AppResult<RwLockReadGuard<'_, Vec<CashRequest>>> {
        self.requests
            .read()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("request store lock poisoned")))
    }

    fn write_requests(&self) -> AppResult<RwLockWriteGuard<'_, Vec<CashRequest>>> {
        self.requests
            .write()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("request store lock poisoned")))
    }
}

#[async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn insert(&self, request: &CashRequest) -> AppResult<CashRequest> {
        let mut requests = self.write_requests()?;
        if requests.iter().any(|existing| existing.id == request.id) {
            return Err(AppError::Conflict("request already exists".to_string()));
        }
        requests.push(request.clone());
        Ok(request.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CashRequest>> {
        Ok(self
            .read_requests()?
            .iter()
            .find(|request| request.id == id)
            .cloned())
    }

    async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>> {
        Ok(self
            .read_requests()?
            .iter()
            .filter(|request| request.is_pending())
            .filter(|request| kind.map_or(true, |kind| request.kind == kind))
            .cloned()
            .collect())
    }

    async fn retire(&self, id: Uuid, reason: RetireReason) -> AppResult<bool> {
        let mut requests = self.write_requests()?;
        Ok(requests
            .iter_mut()
            .find(|request| request.id == id)
            .is_some_and(|request| request.retire(reason, None)))
    }

    async fn retire_pair(&self, first: Uuid, second: Uuid) -> AppResult<(CashRequest, CashRequest)> {
        if first == second {
            return Err(AppError::BadRequest(
                "a request cannot be matched with itself".to_string(),
            ));
        }

        let mut requests = self.write_requests()?;
        let first_index = requests
            .iter()
            .position(|request| request.id == first && request.is_pending());
        let second_index = requests
            .iter()
            .position(|request| request.id == second && request.is_pending());

        let (Some(first_index), Some(second_index)) = (first_index, second_index) else {
            return Err(AppError::Conflict(
                "one of the requests is no longer pending".to_string(),
            ));
        };

        requests[first_index].retire(RetireReason::Matched, Some(second));
        requests[second_index].retire(RetireReason::Matched, Some(first));

        Ok((
            requests[first_index].clone(),
            requests[second_index].clone(),
        ))
    }
}
