use ardoise_core::AppResult;
use ardoise_domain::LogMessage;
use ardoise_telemetry::QueueBinding;
use async_trait::async_trait;
use tracing::info;

/// Logging-only queue binding for development hosts without Redis.
#[derive(Debug, Clone, Default)]
pub struct ConsoleTelemetryQueue;

impl ConsoleTelemetryQueue {
    /// Creates the console binding.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueueBinding for ConsoleTelemetryQueue {
    async fn send(&self, message: LogMessage) -> AppResult<()> {
        info!(
            message_type = message.message_type(),
            timestamp = message.timestamp(),
            "telemetry message (console queue)"
        );
        Ok(())
    }

    async fn send_batch(&self, messages: Vec<LogMessage>) -> AppResult<()> {
        info!(
            message_count = messages.len(),
            "telemetry batch (console queue)"
        );
        Ok(())
    }
}
