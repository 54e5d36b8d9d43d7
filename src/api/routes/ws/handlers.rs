use serde_json::json;

use crate::api::dtos::{CashRequestResponse, MatchResponse};
use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};

use super::messages::{parse_match_payload, parse_ws_envelope};

/// Builds the direct reply to one client frame. Queue-wide effects travel
/// through the hub instead.
pub(super) async fn reply_to_text_message(
    state: &AppState,
    requester_id: &str,
    text: &str,
) -> AppResult<serde_json::Value> {
    let envelope = parse_ws_envelope(text)?;

    let reply = match envelope.message_type.as_str() {
        "ping" => json!({ "type": "pong" }),
        "snapshot" => {
            let pending: Vec<CashRequestResponse> = state
                .request_service
                .list_pending(None)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            json!({ "type": "queue_snapshot", "payload": { "pending": pending } })
        }
        "match" => {
            let parsed = parse_match_payload(envelope.payload)?;
            let result = state
                .matching_service
                .match_request(requester_id, parsed.request_id)
                .await?;
            json!({
                "type": "match_result",
                "payload": {
                    "matched": result.is_some(),
                    "match": result.map(MatchResponse::from),
                }
            })
        }
        _ => json!({ "type": "error", "payload": { "code": "UNSUPPORTED_TYPE" } }),
    };

    Ok(reply)
}

/// Errors a client can recover from are reported on the socket; anything
/// else closes it.
pub(super) fn error_frame(error: &AppError) -> Option<serde_json::Value> {
    match error {
        AppError::BadRequest(_)
        | AppError::ValidationError { .. }
        | AppError::NotFound(_)
        | AppError::Forbidden(_)
        | AppError::Conflict(_)
        | AppError::ServiceUnavailable { .. } => Some(json!({
            "type": "error",
            "payload": {
                "code": error.error_code(),
                "retryable": error.is_retryable(),
            }
        })),
        _ => None,
    }
}
