use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use ardoise_core::AppResult;
use ardoise_domain::{ActivityLogRecord, LogMessage, Stamped};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::warn;

/// A deferred unit of background work with all failures already handled.
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Host handle that keeps the process alive until a background task settles.
///
/// On short-lived request hosts, work that is not registered here may be
/// cancelled the moment the response is flushed.
pub trait LifecycleExtender: Send + Sync {
    /// Accepts a task and guarantees the host waits for it to settle.
    fn extend(&self, task: BackgroundTask);
}

/// Handle to the outbound telemetry message queue.
#[async_trait]
pub trait QueueBinding: Send + Sync {
    /// Delivers one message.
    async fn send(&self, message: LogMessage) -> AppResult<()>;

    /// Delivers many pre-built messages in one round trip.
    async fn send_batch(&self, messages: Vec<LogMessage>) -> AppResult<()>;
}

/// Persistence port for batched activity entries.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Durably writes one activity entry.
    async fn persist(&self, entry: Stamped<ActivityLogRecord>) -> AppResult<()>;
}

/// Persistence port for queue messages on the consumer side.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Durably writes one dequeued telemetry message.
    async fn persist_message(&self, message: LogMessage) -> AppResult<()>;
}

/// Lifecycle extender for long-lived hosts.
///
/// Spawns each task and records its join handle so shutdown can wait for
/// in-flight telemetry instead of dropping it.
#[derive(Default)]
pub struct TrackedTaskExtender {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TrackedTaskExtender {
    /// Creates an extender with no tracked tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until every task handed over so far has settled.
    pub async fn wait_for_settled(&self) {
        loop {
            let drained = match self.handles.lock() {
                Ok(mut guard) => std::mem::take(&mut *guard),
                Err(_) => Vec::new(),
            };
            if drained.is_empty() {
                return;
            }

            for handle in drained {
                if let Err(error) = handle.await {
                    warn!(error = %error, "background task aborted before settling");
                }
            }
        }
    }
}

impl LifecycleExtender for TrackedTaskExtender {
    fn extend(&self, task: BackgroundTask) {
        let handle = tokio::spawn(task);
        if let Ok(mut guard) = self.handles.lock() {
            guard.retain(|tracked| !tracked.is_finished());
            guard.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{LifecycleExtender, TrackedTaskExtender};

    #[tokio::test]
    async fn wait_for_settled_drains_every_extended_task() {
        let extender = Arc::new(TrackedTaskExtender::new());
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let completed = completed.clone();
            extender.extend(Box::pin(async move {
                tokio::task::yield_now().await;
                completed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        extender.wait_for_settled().await;
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn tasks_extended_while_settling_are_drained_before_return() {
        let extender = Arc::new(TrackedTaskExtender::new());
        let completed = Arc::new(AtomicUsize::new(0));

        let chained = {
            let extender = extender.clone();
            let completed = completed.clone();
            Box::pin(async move {
                let completed = completed.clone();
                extender.extend(Box::pin(async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                }));
            })
        };
        extender.extend(chained);

        extender.wait_for_settled().await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }
}
