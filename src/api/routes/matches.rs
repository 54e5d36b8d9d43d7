use actix_web::{web, HttpResponse};

use crate::api::dtos::{
    ClaimMatchRequest, ExactMatchQuery, ExactMatchResponse, MatchResponse, NearbyQuery,
    NearbyRequestResponse,
};
use crate::api::routes::AppState;
use crate::error::AppResult;
use crate::middleware::Requester;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/matches")
            .route("", web::post().to(claim_match))
            .route("/exact", web::get().to(exact_match))
            .route("/nearby", web::get().to(nearby)),
    );
}

async fn exact_match(
    state: web::Data<AppState>,
    query: web::Query<ExactMatchQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let found = state
        .matching_service
        .find_exact_match(query.kind, query.amount)
        .await?;
    Ok(HttpResponse::Ok().json(ExactMatchResponse {
        request: found.map(Into::into),
    }))
}

async fn nearby(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let results = state
        .matching_service
        .find_nearby(query.kind, query.lat, query.lng, query.radius_km)
        .await?;
    let body: Vec<NearbyRequestResponse> = results.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn claim_match(
    state: web::Data<AppState>,
    requester: Requester,
    payload: web::Json<ClaimMatchRequest>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let pair = state
        .matching_service
        .claim_match(&requester.id, payload.request_id, payload.counterparty_id)
        .await?;
    Ok(HttpResponse::Created().json(MatchResponse::from(pair)))
}
