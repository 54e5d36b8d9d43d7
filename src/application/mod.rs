mod events;
mod matching_service;
mod queue_watcher;
mod request_service;

use std::future::Future;
use std::time::Duration;

use crate::error::AppResult;

pub use events::{NoopNotifier, QueueEvent, QueueNotifier};
pub use matching_service::{MatchedPair, MatchingService, NearbyRequest};
pub use queue_watcher::QueueWatcher;
pub use request_service::RequestService;

/// Bounds a store round-trip; expiry surfaces as a retryable error.
pub(crate) async fn with_store_timeout<T, F>(timeout: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(timeout, call).await?
}
