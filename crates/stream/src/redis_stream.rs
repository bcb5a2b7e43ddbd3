// Redis stream publisher for out-of-process viewers

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::StreamMaxlen;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};
use crate::message::StreamMessage;
use crate::notifier::ScoreNotifier;

/// Publishes score updates to a Redis stream keyed by match.
pub struct RedisStream {
    connection: MultiplexedConnection,
    stream_key: String,
    max_len: usize,
}

impl RedisStream {
    pub async fn new(redis_url: &str, stream_key: impl Into<String>, max_len: usize) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;
        let stream_key = stream_key.into();
        info!("📡 Publishing live updates to Redis stream {}", stream_key);
        Ok(Self { connection, stream_key, max_len })
    }

    /// Stream for one match, so viewers can follow a single game.
    pub fn match_key(&self, message: &StreamMessage) -> String {
        format!("{}:{}", self.stream_key, message.match_id)
    }
}

#[async_trait]
impl ScoreNotifier for RedisStream {
    async fn publish(&self, message: &StreamMessage) -> Result<()> {
        let payload = message.to_json()?;
        let key = self.match_key(message);
        let mut conn = self.connection.clone();
        let entry_id: String = conn
            .xadd_maxlen(
                &key,
                StreamMaxlen::Approx(self.max_len),
                "*",
                &[("type", message.update.kind()), ("payload", payload.as_str())],
            )
            .await?;
        debug!("📡 {} -> {} ({})", message.update.kind(), key, entry_id);
        Ok(())
    }
}
