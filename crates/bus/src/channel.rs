//! Broadcast alert channel

use tokio::sync::broadcast;

use crate::event::OwnershipAlert;

/// Default number of alerts buffered per lagging receiver
pub const DEFAULT_CAPACITY: usize = 256;

/// Fire-and-forget alert publisher
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct AlertPublisher {
    sender: broadcast::Sender<OwnershipAlert>,
}

impl AlertPublisher {
    /// Publisher buffering up to `capacity` alerts per lagging receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every current listener; returns how many received it
    ///
    /// Having no listeners is not an error: the alert is dropped.
    pub fn publish(&self, alert: OwnershipAlert) -> usize {
        let asset_id = alert.asset_id.clone();
        let action = alert.action;
        match self.sender.send(alert) {
            Ok(receivers) => {
                tracing::debug!(asset_id = %asset_id, %action, receivers, "Alert published");
                receivers
            }
            Err(_) => {
                tracing::debug!(asset_id = %asset_id, %action, "Alert dropped, no listeners");
                0
            }
        }
    }

    /// New receiver; sees only alerts published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<OwnershipAlert> {
        self.sender.subscribe()
    }

    /// Number of live receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AlertPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
