use std::sync::Arc;
use std::time::Instant;

use actix_web::dev::Service as _;
use actix_web::{middleware::Logger, web, App, HttpServer};
use atm_match::api::routes::{self, AppState};
use atm_match::application::{MatchingService, QueueNotifier, QueueWatcher, RequestService};
use atm_match::config::{AppConfig, StoreBackend};
use atm_match::infrastructure::db::{migrations::run_migrations, pool::create_pool};
use atm_match::infrastructure::geocoding::{DisabledGeocoder, NominatimGeocoder, ReverseGeocoder};
use atm_match::infrastructure::repositories::{
    InMemoryRequestRepository, PgRequestRepository, RequestRepository,
};
use atm_match::middleware::request_logging::{
    create_request_span, get_client_ip, get_requester_id, get_status_class, get_user_agent,
};
use atm_match::observability::AppMetrics;
use atm_match::security::{cors_middleware, security_headers};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info, Instrument};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("failed to load application configuration");
    config
        .validate()
        .expect("invalid application configuration");

    let registry =
        tracing_subscriber::registry().with(EnvFilter::new(config.logging.level.clone()));
    if config.logging.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let (request_repo, db_pool): (Arc<dyn RequestRepository>, Option<PgPool>) =
        match config.store.backend {
            StoreBackend::Memory => {
                info!("using in-memory request store");
                (Arc::new(InMemoryRequestRepository::new()), None)
            }
            StoreBackend::Postgres => {
                let pool = create_pool(&config.database)
                    .await
                    .expect("failed to create database pool");
                run_migrations(&pool)
                    .await
                    .expect("database migrations failed");
                info!("using postgres request store");
                (Arc::new(PgRequestRepository::new(pool.clone())), Some(pool))
            }
        };

    let geocoder: Arc<dyn ReverseGeocoder> = if config.geocoding.enabled {
        Arc::new(
            NominatimGeocoder::new(&config.geocoding).expect("failed to build geocoding client"),
        )
    } else {
        Arc::new(DisabledGeocoder)
    };

    let metrics = Arc::new(AppMetrics::default());
    let ws_hub = routes::ws::WsConnectionHub::default();
    let notifier: Arc<dyn QueueNotifier> = Arc::new(ws_hub.clone());
    let store_timeout = config.matching.store_timeout();

    let state = AppState {
        request_service: Arc::new(
            RequestService::new(request_repo.clone(), store_timeout)
                .with_geocoder(geocoder)
                .with_notifier(notifier.clone())
                .with_metrics(metrics.clone()),
        ),
        matching_service: Arc::new(
            MatchingService::new(request_repo.clone(), &config.matching)
                .with_notifier(notifier.clone())
                .with_metrics(metrics.clone()),
        ),
        security: config.security.clone(),
        app_environment: config.app.environment.clone(),
        metrics: metrics.clone(),
        db_pool,
        ws_hub,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher = QueueWatcher::new(
        request_repo,
        notifier,
        metrics.clone(),
        config.matching.poll_interval(),
        store_timeout,
    )
    .spawn(shutdown_rx);

    let bind_host = config.app.host.clone();
    let bind_port = config.app.port;
    let security_config = config.security.clone();
    info!(host = %bind_host, port = bind_port, "starting http server");

    let server = HttpServer::new(move || {
        let metrics = metrics.clone();
        App::new()
            .wrap(Logger::default())
            .wrap_fn(move |req, srv| {
                let request_id = Uuid::new_v4().to_string();
                let path = req.path().to_string();
                let method = req.method().to_string();
                let span = create_request_span(
                    &request_id,
                    &method,
                    &path,
                    &get_requester_id(&req),
                    &get_client_ip(&req),
                    &get_user_agent(&req),
                );
                let metrics = metrics.clone();
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(mut response) => {
                            response.headers_mut().insert(
                                actix_web::http::header::HeaderName::from_static("x-request-id"),
                                actix_web::http::header::HeaderValue::from_str(&request_id)
                                    .unwrap_or_else(|_| {
                                        actix_web::http::header::HeaderValue::from_static(
                                            "invalid-request-id",
                                        )
                                    }),
                            );

                            let status = response.status().as_u16();
                            let latency_ms = start.elapsed().as_millis() as u64;
                            metrics.record_request(status, latency_ms);
                            if status == 401 {
                                metrics.record_identity_rejection();
                            }

                            info!(
                                status = status,
                                status_class = get_status_class(status),
                                latency_ms = latency_ms,
                                "request completed"
                            );

                            if status >= 500 {
                                error!(status = status, "request failed with server error");
                            }
                            Ok(response)
                        }
                        Err(error) => Err(error),
                    }
                }
                .instrument(span)
            })
            .wrap(cors_middleware(&security_config))
            .wrap(security_headers())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind((bind_host, bind_port))?
    .run();

    let result = server.await;

    let _ = shutdown_tx.send(true);
    if let Err(error) = watcher.await {
        error!(error = %error, "queue watcher task failed");
    }
    info!("server stopped");

    result
}
