// In-process broadcast of live updates, consumed by WebSocket viewers

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use crate::message::StreamMessage;
use crate::notifier::ScoreNotifier;

const DEFAULT_CAPACITY: usize = 1024;

/// In-process broadcast of score updates.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StreamMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreNotifier for EventBus {
    async fn publish(&self, message: &StreamMessage) -> Result<()> {
        // No subscribers is not an error: nobody is watching yet.
        let delivered = self.sender.send(message.clone()).unwrap_or(0);
        debug!("📡 {} delivered to {} viewers", message.update.kind(), delivered);
        Ok(())
    }
}
