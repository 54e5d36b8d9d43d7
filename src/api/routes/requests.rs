use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::api::dtos::{
    CashRequestResponse, CreateCashRequest, MatchAttemptResponse, MatchResponse, PendingQuery,
};
use crate::api::routes::AppState;
use crate::error::AppResult;
use crate::middleware::Requester;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/requests")
            .route("", web::get().to(list_pending))
            .route("", web::post().to(create_request))
            .route("/{id}", web::get().to(get_request))
            .route("/{id}", web::delete().to(cancel_request))
            .route("/{id}/match", web::post().to(match_request)),
    );
}

async fn list_pending(
    state: web::Data<AppState>,
    query: web::Query<PendingQuery>,
) -> AppResult<HttpResponse> {
    let pending = state.request_service.list_pending(query.kind).await?;
    let body: Vec<CashRequestResponse> = pending.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn create_request(
    state: web::Data<AppState>,
    requester: Requester,
    payload: web::Json<CreateCashRequest>,
) -> AppResult<HttpResponse> {
    let created = state
        .request_service
        .submit(&requester.id, requester.display_name, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(CashRequestResponse::from(created)))
}

async fn get_request(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let request = state.request_service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CashRequestResponse::from(request)))
}

async fn cancel_request(
    state: web::Data<AppState>,
    requester: Requester,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .request_service
        .cancel(&requester.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn match_request(
    state: web::Data<AppState>,
    requester: Requester,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let result = state
        .matching_service
        .match_request(&requester.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MatchAttemptResponse {
        matched: result.is_some(),
        result: result.map(MatchResponse::from),
    }))
}
