use crate::telemetry::state_update::StateUpdate;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, warn};

/// Producer side of the bounded channel between the subscriber and the broadcaster.
/// Publishing never waits: a full feed drops the update.
#[derive(Clone)]
pub struct UpdateFeed {
    tx: mpsc::Sender<StateUpdate>,
}

impl UpdateFeed {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StateUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Returns whether the update was queued.
    pub fn publish(&self, update: StateUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                warn!(
                    "Update feed full, dropping update for device {}",
                    update.device_id
                );
                false
            }
            Err(TrySendError::Closed(update)) => {
                error!(
                    "Update feed closed, dropping update for device {}",
                    update.device_id
                );
                false
            }
        }
    }
}
