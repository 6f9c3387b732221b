//! Redis-backed telemetry queue binding.
//!
//! Messages are JSON-encoded and pushed onto a Redis list; the worker pops
//! from the opposite end, so delivery order follows enqueue order. Delivery
//! is best-effort: a failed push is reported to the caller, who is always a
//! background task that logs and discards the error.

use std::num::NonZeroUsize;

use ardoise_core::{AppError, AppResult};
use ardoise_domain::LogMessage;
use ardoise_telemetry::QueueBinding;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Redis list implementation of the telemetry queue binding.
#[derive(Clone)]
pub struct RedisTelemetryQueue {
    client: redis::Client,
    queue_key: String,
}

impl RedisTelemetryQueue {
    /// Creates a queue adapter with a configured Redis client and list key.
    #[must_use]
    pub fn new(client: redis::Client, queue_key: impl Into<String>) -> Self {
        Self {
            client,
            queue_key: queue_key.into(),
        }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    fn encode(message: &LogMessage) -> AppResult<String> {
        serde_json::to_string(message).map_err(|error| {
            AppError::Internal(format!("failed to encode telemetry message: {error}"))
        })
    }

    /// Pops up to `limit` raw messages from the consumer end of the queue.
    ///
    /// Returns an empty vector when the queue is drained.
    pub async fn pop_batch(&self, limit: usize) -> AppResult<Vec<String>> {
        let Some(count) = NonZeroUsize::new(limit) else {
            return Ok(Vec::new());
        };

        let mut connection = self.connection().await?;
        let popped: Option<Vec<String>> = connection
            .rpop(self.queue_key.as_str(), Some(count))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to pop telemetry messages: {error}"))
            })?;

        Ok(popped.unwrap_or_default())
    }
}

#[async_trait]
impl QueueBinding for RedisTelemetryQueue {
    async fn send(&self, message: LogMessage) -> AppResult<()> {
        let encoded = Self::encode(&message)?;
        let mut connection = self.connection().await?;

        connection
            .lpush::<_, _, ()>(self.queue_key.as_str(), encoded)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to push telemetry message: {error}"))
            })
    }

    async fn send_batch(&self, messages: Vec<LogMessage>) -> AppResult<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut encoded = Vec::with_capacity(messages.len());
        for message in &messages {
            encoded.push(Self::encode(message)?);
        }

        let mut connection = self.connection().await?;
        connection
            .lpush::<_, _, ()>(self.queue_key.as_str(), encoded)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to push telemetry batch: {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use ardoise_domain::{ActivityLogRecord, LogMessage, NetworkMetadata, Stamped};
    use ardoise_telemetry::QueueBinding;

    use super::RedisTelemetryQueue;

    fn test_queue() -> Option<RedisTelemetryQueue> {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return None;
        };

        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(error) => panic!("failed to open REDIS_URL in test: {error}"),
        };

        Some(RedisTelemetryQueue::new(
            client,
            format!("ardoise:test:telemetry:{}", std::process::id()),
        ))
    }

    fn message(action: &str) -> LogMessage {
        LogMessage::ActivityLog(Stamped::with_timestamp(
            ActivityLogRecord {
                user_id: None,
                school_id: None,
                action: action.to_owned(),
                resource: None,
                resource_id: None,
                metadata: None,
                network: NetworkMetadata::default(),
            },
            7,
        ))
    }

    #[tokio::test]
    async fn push_and_pop_preserve_enqueue_order() {
        let Some(queue) = test_queue() else {
            return;
        };

        assert!(queue.send(message("first")).await.is_ok());
        assert!(queue.send_batch(vec![message("second"), message("third")]).await.is_ok());

        let popped = queue.pop_batch(10).await;
        let Ok(popped) = popped else {
            panic!("pop_batch failed");
        };

        assert_eq!(popped.len(), 3);
        assert!(popped[0].contains("first"));
        assert!(popped[2].contains("third"));
    }
}
