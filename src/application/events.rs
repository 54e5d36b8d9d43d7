use serde::Serialize;
use uuid::Uuid;

use super::matching_service::MatchedPair;
use crate::domain::{CashRequest, RequestStatus};

/// Change notifications fanned out to queue observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum QueueEvent {
    RequestCreated(CashRequest),
    RequestRetired { id: Uuid, status: RequestStatus },
    MatchFound(MatchedPair),
    QueueSnapshot { pending: Vec<CashRequest> },
}

impl QueueEvent {
    /// Requesters that should receive the event; `None` means everyone.
    pub fn recipients(&self) -> Option<Vec<String>> {
        match self {
            QueueEvent::MatchFound(pair) => Some(vec![
                pair.request.requester_id.clone(),
                pair.counterparty.requester_id.clone(),
            ]),
            _ => None,
        }
    }
}

pub trait QueueNotifier: Send + Sync {
    fn publish(&self, event: &QueueEvent);
}

pub struct NoopNotifier;

impl QueueNotifier for NoopNotifier {
    fn publish(&self, _event: &QueueEvent) {}
}
