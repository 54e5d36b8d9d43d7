use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the postgres pool, absent when the in-memory store is active.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

#[derive(Default)]
pub struct AppMetrics {
    request_count: AtomicU64,
    error_count: AtomicU64,
    identity_rejection_count: AtomicU64,
    ws_connections: AtomicU64,
    latency_total_ms: AtomicU64,
    latency_count: AtomicU64,
    requests_created: AtomicU64,
    matches_total: AtomicU64,
    match_conflicts: AtomicU64,
    pending_depth: AtomicU64,
}

impl AppMetrics {
    pub fn record_request(&self, status: u16, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_total_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_identity_rejection(&self) {
        self.identity_rejection_count
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn ws_connected(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ws_disconnected(&self) {
        self.ws_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_created(&self) {
        self.requests_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn match_completed(&self) {
        self.matches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn match_conflict(&self) {
        self.match_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_pending_depth(&self, depth: usize) {
        self.pending_depth
            .store(depth as u64, Ordering::Relaxed);
    }

    pub fn matches_total(&self) -> u64 {
        self.matches_total.load(Ordering::Relaxed)
    }

    pub fn match_conflicts(&self) -> u64 {
        self.match_conflicts.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self, pool: Option<PoolStats>) -> String {
        let count = self.latency_count.load(Ordering::Relaxed).max(1);
        let avg_latency = self.latency_total_ms.load(Ordering::Relaxed) as f64 / count as f64;

        let mut rendered = format!(
            concat!(
                "# TYPE http_requests_total counter\n",
                "http_requests_total {}\n",
                "# TYPE http_error_total counter\n",
                "http_error_total {}\n",
                "# TYPE identity_rejections_total counter\n",
                "identity_rejections_total {}\n",
                "# TYPE ws_connections gauge\n",
                "ws_connections {}\n",
                "# TYPE http_latency_avg_ms gauge\n",
                "http_latency_avg_ms {:.2}\n",
                "# TYPE cash_requests_created_total counter\n",
                "cash_requests_created_total {}\n",
                "# TYPE matches_total counter\n",
                "matches_total {}\n",
                "# TYPE match_conflicts_total counter\n",
                "match_conflicts_total {}\n",
                "# TYPE pending_requests gauge\n",
                "pending_requests {}\n",
            ),
            self.request_count.load(Ordering::Relaxed),
            self.error_count.load(Ordering::Relaxed),
            self.identity_rejection_count.load(Ordering::Relaxed),
            self.ws_connections.load(Ordering::Relaxed),
            avg_latency,
            self.requests_created.load(Ordering::Relaxed),
            self.matches_total.load(Ordering::Relaxed),
            self.match_conflicts.load(Ordering::Relaxed),
            self.pending_depth.load(Ordering::Relaxed),
        );

        if let Some(pool) = pool {
            rendered.push_str(&format!(
                concat!(
                    "# TYPE db_pool_size gauge\n",
                    "db_pool_size {}\n",
                    "# TYPE db_pool_idle gauge\n",
                    "db_pool_idle {}\n",
                ),
                pool.size, pool.idle,
            ));
        }

        rendered
    }
}
