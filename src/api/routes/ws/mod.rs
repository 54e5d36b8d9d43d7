use std::time::Duration;

use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::Requester;

mod handlers;
mod hub;
mod messages;

use self::handlers::{error_frame, reply_to_text_message};

pub use self::hub::WsConnectionHub;
pub use self::messages::{WsClientEnvelope, WsMatchPayload};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_REQUESTER_ID_LEN: usize = 128;

#[derive(Deserialize)]
struct SubscribeQuery {
    requester_id: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_upgrade));
}

async fn ws_upgrade(
    request: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    if state.app_environment == "production" && !is_secure_ws_request(&request) {
        return Err(AppError::BadRequest(
            "wss is required in production".to_string(),
        ));
    }

    let requester_id = subscriber_id(&request)?;

    let (response, session, stream) = actix_ws::handle(&request, payload)
        .map_err(|_| AppError::BadRequest("invalid websocket upgrade".to_string()))?;

    let state = state.into_inner();
    let hub = state.ws_hub.clone();
    let outbound_rx = hub.register(&requester_id);
    let metrics = state.metrics.clone();
    metrics.ws_connected();
    info!(requester_id = %requester_id, "queue subscriber connected");

    actix_web::rt::spawn(async move {
        let _ = ws_loop(session, stream, outbound_rx, &state, &requester_id).await;
        hub.prune_requester(&requester_id);
        metrics.ws_disconnected();
        info!(requester_id = %requester_id, "queue subscriber disconnected");
    });

    Ok(response)
}

/// Browsers cannot set custom headers on a websocket handshake, so the
/// requester id may also arrive as a query parameter.
fn subscriber_id(request: &HttpRequest) -> AppResult<String> {
    if let Ok(requester) = Requester::from_headers(request) {
        return Ok(requester.id);
    }

    web::Query::<SubscribeQuery>::from_query(request.query_string())
        .ok()
        .and_then(|query| query.into_inner().requester_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUESTER_ID_LEN)
        .ok_or(AppError::Unauthorized)
}

fn is_secure_ws_request(request: &HttpRequest) -> bool {
    if request.connection_info().scheme() == "https" {
        return true;
    }

    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

async fn ws_loop(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    state: &AppState,
    requester_id: &str,
) -> AppResult<()> {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_seen = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > HEARTBEAT_TIMEOUT {
                    debug!(requester_id = %requester_id, "websocket heartbeat timed out");
                    let _ = session.close(None).await;
                    break;
                }
                if session.ping(b"ping").await.is_err() {
                    break;
                }
            }
            maybe_message = stream.next() => {
                let Some(Ok(message)) = maybe_message else {
                    break;
                };

                match message {
                    actix_ws::Message::Ping(bytes) => {
                        last_seen = tokio::time::Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    actix_ws::Message::Pong(_) => {
                        last_seen = tokio::time::Instant::now();
                    }
                    actix_ws::Message::Text(text) => {
                        last_seen = tokio::time::Instant::now();
                        let frame = match reply_to_text_message(state, requester_id, &text).await {
                            Ok(reply) => reply,
                            Err(error) => match error_frame(&error) {
                                Some(frame) => frame,
                                None => break,
                            },
                        };
                        if session.text(frame.to_string()).await.is_err() {
                            break;
                        }
                    }
                    actix_ws::Message::Close(reason) => {
                        let _ = session.close(reason).await;
                        break;
                    }
                    actix_ws::Message::Binary(_) => {
                        let payload = json!({ "type": "error", "payload": { "code": "UNSUPPORTED_BINARY" } });
                        if session.text(payload.to_string()).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            maybe_outbound = outbound_rx.recv() => {
                let Some(payload) = maybe_outbound else {
                    break;
                };
                if session.text(payload).await.is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}
