use crate::telemetry::StateUpdate;
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Serialized StateUpdate frames waiting to be written to one session.
pub type OutboundQueue = mpsc::Receiver<Utf8Bytes>;

/// Registered live sessions. The registry owns the only sender of each session's queue,
/// so removing a session closes its queue.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, mpsc::Sender<Utf8Bytes>>>>,
    queue_size: usize,
}

impl SessionRegistry {
    pub fn new(queue_size: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            queue_size: queue_size.max(1),
        }
    }

    pub async fn register(&self) -> (SessionId, OutboundQueue) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_size);
        let count = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id, tx);
            sessions.len()
        };
        info!(session = %id, "Session registered ({} live)", count);
        (id, rx)
    }

    /// Returns whether the session was still registered.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Offers the update to every session without waiting. Sessions whose queue is full
    /// (or already closed) are evicted. Returns how many sessions accepted the update.
    pub async fn broadcast(&self, update: &StateUpdate) -> usize {
        let frame: Utf8Bytes = match serde_json::to_string(update) {
            Ok(text) => text.into(),
            Err(e) => {
                error!("Unable to serialize update for device {}: {}", update.device_id, e);
                return 0;
            }
        };

        let mut delivered = 0;
        let mut evicted = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, tx) in sessions.iter() {
                match tx.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(session = %id, "Session queue full, dropping slow session");
                        evicted.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(session = %id, "Session queue closed");
                        evicted.push(*id);
                    }
                }
            }
        }

        if !evicted.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &evicted {
                sessions.remove(id);
            }
        }
        delivered
    }
}
