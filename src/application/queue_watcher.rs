use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::events::{QueueEvent, QueueNotifier};
use super::with_store_timeout;
use crate::domain::CashRequest;
use crate::error::AppResult;
use crate::infrastructure::repositories::RequestRepository;
use crate::observability::AppMetrics;

/// Polls the shared queue and pushes a snapshot whenever the pending set
/// changes. Catches writes made by other replicas against the same database.
pub struct QueueWatcher {
    request_repo: Arc<dyn RequestRepository>,
    notifier: Arc<dyn QueueNotifier>,
    metrics: Arc<AppMetrics>,
    interval: Duration,
    store_timeout: Duration,
    last_fingerprint: Option<u64>,
}

impl QueueWatcher {
    pub fn new(
        request_repo: Arc<dyn RequestRepository>,
        notifier: Arc<dyn QueueNotifier>,
        metrics: Arc<AppMetrics>,
        interval: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            request_repo,
            notifier,
            metrics,
            interval,
            store_timeout,
            last_fingerprint: None,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "queue watcher started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(error) = self.poll_once().await {
                        warn!(error = %error, "queue poll failed");
                    }
                }
            }
        }

        info!("queue watcher stopped");
    }

    /// Reads the pending set once. Returns whether a snapshot was published.
    pub async fn poll_once(&mut self) -> AppResult<bool> {
        let pending =
            with_store_timeout(self.store_timeout, self.request_repo.list_pending(None)).await?;
        self.metrics.set_pending_depth(pending.len());

        let fingerprint = fingerprint(&pending);
        if self.last_fingerprint == Some(fingerprint) {
            return Ok(false);
        }
        self.last_fingerprint = Some(fingerprint);

        debug!(pending = pending.len(), "pending queue changed");
        self.notifier
            .publish(&QueueEvent::QueueSnapshot { pending });
        Ok(true)
    }
}

fn fingerprint(pending: &[CashRequest]) -> u64 {
    let mut hasher = DefaultHasher::new();
    pending.len().hash(&mut hasher);
    for request in pending {
        request.id.hash(&mut hasher);
        request.updated_at.hash(&mut hasher);
    }
    hasher.finish()
}
