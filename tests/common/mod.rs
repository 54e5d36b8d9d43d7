#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use atm_match::api::routes::{ws::WsConnectionHub, AppState};
use atm_match::application::{MatchingService, QueueNotifier, RequestService};
use atm_match::config::{MatchingConfig, SecurityConfig};
use atm_match::infrastructure::db::migrations::run_migrations;
use atm_match::infrastructure::geocoding::ReverseGeocoder;
use atm_match::infrastructure::repositories::RequestRepository;
use atm_match::observability::AppMetrics;
use once_cell::sync::Lazy;
use serde::Deserialize;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use tokio::sync::{Mutex, MutexGuard};

pub mod fixtures;
pub mod mocks;

/// JSON error body rendered by `AppError`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub code: String,
    pub retryable: bool,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

static TEST_DB_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestDb {
    pool: PgPool,
    _db_lock_conn: PgConnection,
    _lock: MutexGuard<'static, ()>,
}

impl TestDb {
    /// Returns `None` when no database is configured so the test can skip.
    /// Panics in CI to catch configuration issues.
    pub async fn new() -> Option<Self> {
        dotenvy::dotenv().ok();
        let url = env::var("TEST_DATABASE_URL")
            .ok()
            .or_else(|| env::var("DATABASE_URL").ok());

        let url = match url {
            Some(u) => u,
            None => {
                if env::var("CI").is_ok() {
                    panic!(
                        "DATABASE_URL or TEST_DATABASE_URL not set in CI. \
                        Integration tests require a database connection."
                    );
                }
                eprintln!("Skipping test: DATABASE_URL or TEST_DATABASE_URL not set (run locally)");
                return None;
            }
        };

        let lock = Lazy::force(&TEST_DB_MUTEX).lock().await;

        // Serializes resets across test binaries sharing one database.
        let mut db_lock_conn = PgConnection::connect(&url).await.ok()?;
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(7_i64)
            .execute(&mut db_lock_conn)
            .await
            .ok()?;

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .ok()?;

        run_migrations(&pool).await.ok()?;
        sqlx::query("TRUNCATE cash_requests")
            .execute(&pool)
            .await
            .ok()?;

        Some(Self {
            pool,
            _db_lock_conn: db_lock_conn,
            _lock: lock,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub fn test_matching_config() -> MatchingConfig {
    MatchingConfig {
        store_timeout_ms: 500,
        ..MatchingConfig::default()
    }
}

/// Wires services over `repo` the same way `main` does, with the hub as the
/// event sink.
pub fn app_state(repo: Arc<dyn RequestRepository>) -> AppState {
    app_state_with(repo, None)
}

pub fn app_state_with(
    repo: Arc<dyn RequestRepository>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
) -> AppState {
    let config = test_matching_config();
    let hub = WsConnectionHub::default();
    let notifier: Arc<dyn QueueNotifier> = Arc::new(hub.clone());
    let metrics = Arc::new(AppMetrics::default());

    let mut request_service = RequestService::new(repo.clone(), config.store_timeout())
        .with_notifier(notifier.clone())
        .with_metrics(metrics.clone());
    if let Some(geocoder) = geocoder {
        request_service = request_service.with_geocoder(geocoder);
    }

    AppState {
        request_service: Arc::new(request_service),
        matching_service: Arc::new(
            MatchingService::new(repo.clone(), &config)
                .with_notifier(notifier)
                .with_metrics(metrics.clone()),
        ),
        security: SecurityConfig::default(),
        app_environment: "test".to_string(),
        metrics,
        db_pool: None,
        ws_hub: hub,
    }
}
