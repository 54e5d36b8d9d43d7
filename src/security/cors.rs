use actix_cors::Cors;
use actix_web::http::header;

use crate::config::SecurityConfig;

pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
pub const REQUESTER_NAME_HEADER: &str = "x-requester-name";

pub fn cors_middleware(config: &SecurityConfig) -> Cors {
    let allowlist = config.cors_allowed_origins.clone();

    Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(REQUESTER_ID_HEADER)
        .allowed_header(REQUESTER_NAME_HEADER)
        .expose_headers(vec!["x-request-id"])
        .allowed_origin_fn(move |origin, _| {
            origin
                .to_str()
                .ok()
                .map(|value| allowlist.iter().any(|allowed| allowed == value))
                .unwrap_or(false)
        })
        .max_age(3600)
}
