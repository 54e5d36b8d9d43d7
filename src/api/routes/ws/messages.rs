use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WsClientEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: Option<Value>,
}

/// Asks the server to run the matcher for one of the caller's requests.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WsMatchPayload {
    pub request_id: Uuid,
}

pub(super) fn parse_ws_envelope(text: &str) -> AppResult<WsClientEnvelope> {
    serde_json::from_str(text)
        .map_err(|_| AppError::BadRequest("invalid websocket message".to_string()))
}

pub(super) fn parse_match_payload(payload: Option<Value>) -> AppResult<WsMatchPayload> {
    let payload =
        payload.ok_or_else(|| AppError::BadRequest("missing match payload".to_string()))?;
    serde_json::from_value(payload)
        .map_err(|_| AppError::BadRequest("invalid match payload".to_string()))
}
