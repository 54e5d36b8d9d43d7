use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CashRequest, RequestKind, RetireReason};
use crate::error::AppResult;

/// The shared queue of withdrawal/deposit requests.
///
/// Implementations keep insertion order for `list_pending` and never move a
/// request out of a terminal status.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert(&self, request: &CashRequest) -> AppResult<CashRequest>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CashRequest>>;

    /// Pending requests, oldest first, optionally narrowed to one kind.
    async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>>;

    /// Retires a pending request. Unknown or already retired ids are a no-op
    /// and yield `Ok(false)`.
    async fn retire(&self, id: Uuid, reason: RetireReason) -> AppResult<bool>;

    /// Marks both requests matched with each other, but only if both are
    /// still pending. Otherwise nothing is written and `AppError::Conflict`
    /// is returned.
    async fn retire_pair(&self, first: Uuid, second: Uuid) -> AppResult<(CashRequest, CashRequest)>;

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
