use std::sync::{Arc, Mutex};

use ardoise_core::{AppResult, SchoolId, UserId};
use ardoise_domain::{
    ActivityLogRecord, AuditAction, AuditLogRecord, LogMessage, NetworkMetadata, Stamped,
};
use async_trait::async_trait;
use chrono::Utc;

use super::{queue_activity_log, queue_audit_log, queue_batch};
use crate::ports::QueueBinding;
use crate::scope;

#[derive(Default)]
struct CapturingBinding {
    sent: Mutex<Vec<LogMessage>>,
    batches: Mutex<Vec<Vec<LogMessage>>>,
}

impl CapturingBinding {
    fn sent_messages(&self) -> Vec<LogMessage> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn batch_count(&self) -> usize {
        self.batches.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl QueueBinding for CapturingBinding {
    async fn send(&self, message: LogMessage) -> AppResult<()> {
        self.sent
            .lock()
            .map_err(|error| {
                ardoise_core::AppError::Internal(format!("failed to lock binding state: {error}"))
            })?
            .push(message);
        Ok(())
    }

    async fn send_batch(&self, messages: Vec<LogMessage>) -> AppResult<()> {
        self.batches
            .lock()
            .map_err(|error| {
                ardoise_core::AppError::Internal(format!("failed to lock binding state: {error}"))
            })?
            .push(messages);
        Ok(())
    }
}

fn delete_student_record() -> AuditLogRecord {
    AuditLogRecord {
        school_id: SchoolId::new("s1"),
        user_id: UserId::new("u1"),
        action: AuditAction::Delete,
        table_name: "students".to_owned(),
        record_id: "r1".to_owned(),
        old_values: None,
        new_values: None,
        network: NetworkMetadata::default(),
    }
}

async fn drain_background_tasks() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn queued_audit_log_is_stamped_and_delivered_with_matching_type() {
    scope::with_scope(async {
        let binding = Arc::new(CapturingBinding::default());
        scope::set_queue_binding(binding.clone());

        let before = Utc::now().timestamp_millis();
        queue_audit_log(delete_student_record());
        drain_background_tasks().await;
        let after = Utc::now().timestamp_millis();

        let sent = binding.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_type(), "audit_log");
        assert!(sent[0].timestamp() >= before);
        assert!(sent[0].timestamp() <= after);
    })
    .await;
}

#[tokio::test]
async fn queued_activity_log_carries_the_record_through_its_variant() {
    scope::with_scope(async {
        let binding = Arc::new(CapturingBinding::default());
        scope::set_queue_binding(binding.clone());

        queue_activity_log(ActivityLogRecord {
            user_id: Some(UserId::new("u1")),
            school_id: Some(SchoolId::new("s1")),
            action: "list".to_owned(),
            resource: Some("students".to_owned()),
            resource_id: None,
            metadata: None,
            network: NetworkMetadata::default(),
        });
        drain_background_tasks().await;

        let sent = binding.sent_messages();
        assert_eq!(sent.len(), 1);
        let Some(LogMessage::ActivityLog(stamped)) = sent.first() else {
            panic!("expected an activity_log message");
        };
        assert_eq!(stamped.record.action, "list");
        assert_eq!(stamped.record.resource.as_deref(), Some("students"));
    })
    .await;
}

#[tokio::test]
async fn missing_binding_drops_the_message_without_error() {
    scope::with_scope(async {
        let binding = Arc::new(CapturingBinding::default());
        scope::set_queue_binding(binding.clone());

        // The nested scope has no binding of its own, so the message is
        // dropped with a warning instead of reaching the outer binding.
        scope::with_scope(async {
            queue_audit_log(delete_student_record());
        })
        .await;
        drain_background_tasks().await;

        assert_eq!(binding.sent_messages().len(), 0);
    })
    .await;
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    scope::with_scope(async {
        let binding = Arc::new(CapturingBinding::default());
        scope::set_queue_binding(binding.clone());

        queue_batch(Vec::new());
        drain_background_tasks().await;

        assert_eq!(binding.batch_count(), 0);
    })
    .await;
}

#[tokio::test]
async fn batch_is_delivered_in_one_round_trip() {
    scope::with_scope(async {
        let binding = Arc::new(CapturingBinding::default());
        scope::set_queue_binding(binding.clone());

        let record = ActivityLogRecord {
            user_id: Some(UserId::new("u1")),
            school_id: Some(SchoolId::new("s1")),
            action: "view".to_owned(),
            resource: Some("grades".to_owned()),
            resource_id: None,
            metadata: None,
            network: NetworkMetadata::default(),
        };
        let messages = vec![
            LogMessage::ActivityLog(Stamped::with_timestamp(record.clone(), 1)),
            LogMessage::ActivityLog(Stamped::with_timestamp(record, 2)),
        ];

        queue_batch(messages);
        drain_background_tasks().await;

        assert_eq!(binding.batch_count(), 1);
        assert_eq!(binding.sent_messages().len(), 0);
    })
    .await;
}

#[tokio::test]
async fn transport_failure_is_swallowed_by_the_background_task() {
    struct FailingBinding;

    #[async_trait]
    impl QueueBinding for FailingBinding {
        async fn send(&self, _message: LogMessage) -> AppResult<()> {
            Err(ardoise_core::AppError::Internal(
                "queue unavailable".to_owned(),
            ))
        }

        async fn send_batch(&self, _messages: Vec<LogMessage>) -> AppResult<()> {
            Err(ardoise_core::AppError::Internal(
                "queue unavailable".to_owned(),
            ))
        }
    }

    scope::with_scope(async {
        scope::set_queue_binding(Arc::new(FailingBinding));

        queue_audit_log(delete_student_record());
        drain_background_tasks().await;
        // Reaching this point is the assertion: the failure stayed inside
        // the background task.
    })
    .await;
}
