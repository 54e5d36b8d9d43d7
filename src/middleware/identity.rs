use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::error::{AppError, AppResult};
use crate::security::{REQUESTER_ID_HEADER, REQUESTER_NAME_HEADER};

const MAX_REQUESTER_ID_LEN: usize = 128;
const MAX_REQUESTER_NAME_LEN: usize = 128;

/// Caller identity as asserted by the upstream identity provider.
///
/// The gateway in front of this service authenticates the user and forwards
/// the provider's stable id in `X-Requester-Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    pub display_name: Option<String>,
}

impl Requester {
    pub fn from_headers(req: &HttpRequest) -> AppResult<Self> {
        let id = header_value(req, REQUESTER_ID_HEADER)
            .filter(|value| value.len() <= MAX_REQUESTER_ID_LEN)
            .ok_or(AppError::Unauthorized)?;

        let display_name = header_value(req, REQUESTER_NAME_HEADER)
            .map(|name| name.chars().take(MAX_REQUESTER_NAME_LEN).collect());

        Ok(Self { id, display_name })
    }
}

impl FromRequest for Requester {
    type Error = AppError;
    type Future = Ready<AppResult<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
