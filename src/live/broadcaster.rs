use crate::live::registry::SessionRegistry;
use crate::telemetry::StateUpdate;
use tokio::sync::mpsc;
use tracing::{info, trace};

/// Drains the update feed into every registered session until the feed closes.
pub async fn run(mut updates: mpsc::Receiver<StateUpdate>, registry: SessionRegistry) {
    while let Some(update) = updates.recv().await {
        let delivered = registry.broadcast(&update).await;
        trace!(
            "Broadcast update for device {} to {} session(s)",
            update.device_id, delivered
        );
    }
    info!("Update feed closed, broadcaster stopping");
}
