use std::sync::Arc;

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse, ResponseError};
use sqlx::PgPool;

use crate::application::{MatchingService, RequestService};
use crate::config::SecurityConfig;
use crate::error::{AppError, AppResult};
use crate::observability::{AppMetrics, PoolStats};

pub mod matches;
pub mod requests;
pub mod ws;

#[derive(Clone)]
pub struct AppState {
    pub request_service: Arc<RequestService>,
    pub matching_service: Arc<MatchingService>,
    pub security: SecurityConfig,
    pub app_environment: String,
    pub metrics: Arc<AppMetrics>,
    /// Present only when the postgres store is active.
    pub db_pool: Option<PgPool>,
    pub ws_hub: ws::WsConnectionHub,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        let message = err.to_string();
        InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        let message = err.to_string();
        InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        let message = err.to_string();
        InternalError::from_response(err, AppError::BadRequest(message).error_response()).into()
    }))
    .service(
        web::scope("/api/v1")
            .configure(requests::configure)
            .configure(matches::configure),
    )
    .configure(ws::configure)
    .route("/health", web::get().to(health))
    .route("/ready", web::get().to(ready))
    .route("/metrics", web::get().to(metrics));
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    state
        .request_service
        .ping()
        .await
        .map_err(|e| AppError::ServiceUnavailable {
            service: "request store".to_string(),
            message: format!("Service not ready: {e}"),
        })?;
    Ok(HttpResponse::Ok().body("ready"))
}

async fn metrics(state: web::Data<AppState>, request: HttpRequest) -> AppResult<HttpResponse> {
    if state.security.metrics_allow_private_only {
        let ip = request
            .peer_addr()
            .map(|addr| addr.ip())
            .ok_or(AppError::Unauthorized)?;

        if !is_private_or_loopback(ip) {
            return Err(AppError::Unauthorized);
        }
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(state.metrics.render_prometheus(pool_stats(&state))))
}

fn is_private_or_loopback(ip: std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        std::net::IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local(),
    }
}

fn pool_stats(state: &web::Data<AppState>) -> Option<PoolStats> {
    state.db_pool.as_ref().map(|pool| PoolStats {
        size: pool.size(),
        idle: pool.num_idle(),
    })
}
