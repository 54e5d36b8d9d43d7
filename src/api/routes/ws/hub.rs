use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tracing::warn;

use crate::application::{QueueEvent, QueueNotifier};

type Sessions = HashMap<String, Vec<mpsc::UnboundedSender<String>>>;

/// Live websocket subscribers keyed by requester id. One requester may hold
/// several sockets (tabs, devices).
#[derive(Clone, Default)]
pub struct WsConnectionHub {
    sessions: Arc<RwLock<Sessions>>,
}

impl WsConnectionHub {
    fn read_sessions(&self) -> RwLockReadGuard<'_, Sessions> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, Sessions> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, requester_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = self.write_sessions();
        sessions
            .entry(requester_id.to_string())
            .or_default()
            .push(tx);
        rx
    }

    pub fn prune_requester(&self, requester_id: &str) {
        let mut sessions = self.write_sessions();
        prune(&mut sessions, requester_id);
    }

    pub fn connection_count(&self) -> usize {
        self.read_sessions().values().map(Vec::len).sum()
    }

    pub fn broadcast_all(&self, payload: &str) {
        let snapshot: Vec<(String, Vec<mpsc::UnboundedSender<String>>)> = self
            .read_sessions()
            .iter()
            .map(|(requester_id, senders)| (requester_id.clone(), senders.clone()))
            .collect();
        self.deliver(snapshot, payload);
    }

    pub fn broadcast_to_requesters(&self, requester_ids: &[String], payload: &str) {
        let snapshot: Vec<(String, Vec<mpsc::UnboundedSender<String>>)> = {
            let sessions = self.read_sessions();
            requester_ids
                .iter()
                .filter_map(|requester_id| {
                    sessions
                        .get(requester_id)
                        .cloned()
                        .map(|items| (requester_id.clone(), items))
                })
                .collect()
        };
        self.deliver(snapshot, payload);
    }

    fn deliver(&self, snapshot: Vec<(String, Vec<mpsc::UnboundedSender<String>>)>, payload: &str) {
        let mut prune_targets = Vec::new();
        for (requester_id, senders) in snapshot {
            let mut had_closed = false;
            for sender in &senders {
                if sender.send(payload.to_string()).is_err() {
                    had_closed = true;
                }
            }
            if had_closed {
                prune_targets.push(requester_id);
            }
        }

        if !prune_targets.is_empty() {
            let mut sessions = self.write_sessions();
            for requester_id in prune_targets {
                prune(&mut sessions, &requester_id);
            }
        }
    }
}

fn prune(sessions: &mut Sessions, requester_id: &str) {
    if let Some(requester_sessions) = sessions.get_mut(requester_id) {
        requester_sessions.retain(|sender| !sender.is_closed());
        if requester_sessions.is_empty() {
            sessions.remove(requester_id);
        }
    }
}

impl QueueNotifier for WsConnectionHub {
    fn publish(&self, event: &QueueEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "failed to serialize queue event");
                return;
            }
        };

        match event.recipients() {
            Some(requester_ids) => self.broadcast_to_requesters(&requester_ids, &payload),
            None => self.broadcast_all(&payload),
        }
    }
}
