use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;
use crate::message::StreamMessage;

/// Sink for "innings changed" announcements. Publishing is fire-and-forget
/// for the scoring core: a failure is reported, never retried.
#[async_trait]
pub trait ScoreNotifier: Send + Sync {
    async fn publish(&self, message: &StreamMessage) -> Result<()>;
}

/// Publishes to every inner notifier; one failing sink does not stop the rest.
#[derive(Default, Clone)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn ScoreNotifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ScoreNotifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl ScoreNotifier for FanoutNotifier {
    async fn publish(&self, message: &StreamMessage) -> Result<()> {
        let mut failures = 0_usize;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(message).await {
                failures += 1;
                warn!("⚠️ Notifier failed for {}: {}", message.update.kind(), e);
            }
        }
        if failures > 0 {
            anyhow::bail!("{} of {} notifiers failed", failures, self.sinks.len());
        }
        Ok(())
    }
}
