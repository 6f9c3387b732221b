//! Typed, fire-and-forget producers for the telemetry queue.
//!
//! Every function here is O(1) synchronous work from the caller's point of
//! view: the timestamp is stamped, the message is wrapped, and delivery is
//! deferred through [`background::run`]. A missing queue binding degrades to
//! a logged warning, never an error on the request path.

use ardoise_domain::{ActivityLogRecord, ApiMetricRecord, AuditLogRecord, LogMessage};
use tracing::warn;

use crate::background;
use crate::scope;

/// Queues one audit log entry for asynchronous delivery.
pub fn queue_audit_log(record: AuditLogRecord) {
    send_to_queue(LogMessage::audit_log(record));
}

/// Queues one user-activity entry for asynchronous delivery.
pub fn queue_activity_log(record: ActivityLogRecord) {
    send_to_queue(LogMessage::activity_log(record));
}

/// Queues one API request measurement for asynchronous delivery.
pub fn queue_api_metric(record: ApiMetricRecord) {
    send_to_queue(LogMessage::api_metric(record));
}

/// Sends many pre-built messages in one transport round trip.
pub fn queue_batch(messages: Vec<LogMessage>) {
    if messages.is_empty() {
        return;
    }

    let Some(binding) = scope::queue_binding() else {
        warn!(
            message_count = messages.len(),
            "no queue binding installed, dropping telemetry batch"
        );
        return;
    };

    background::run(async move { binding.send_batch(messages).await });
}

fn send_to_queue(message: LogMessage) {
    let Some(binding) = scope::queue_binding() else {
        warn!(
            message_type = message.message_type(),
            "no queue binding installed, dropping telemetry message"
        );
        return;
    };

    background::run(async move { binding.send(message).await });
}

#[cfg(test)]
mod tests;
