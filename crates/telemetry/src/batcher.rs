//! Size- and timer-triggered batching of activity entries.
//!
//! One batcher instance is shared process-wide: the batching policy is meant
//! to coalesce activity across every request the process handles, not per
//! request. The queue mutex is never held across an await; a flush snapshots
//! and clears the queue under the lock before any asynchronous work starts,
//! so exactly one flush drains a given batch and entries enqueued during a
//! drain start a fresh one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ardoise_core::AppResult;
use ardoise_domain::{ActivityLogRecord, Stamped};
use tracing::warn;

use crate::background;
use crate::ports::ActivityStore;

/// Longest time an entry waits in memory before a flush is forced.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(5000);

/// Queue length at which a flush is triggered immediately.
pub const MAX_QUEUE_SIZE: usize = 50;

#[derive(Default)]
struct BatchState {
    queue: Vec<Stamped<ActivityLogRecord>>,
    timer_armed: bool,
}

struct BatcherInner {
    store: Arc<dyn ActivityStore>,
    state: Mutex<BatchState>,
    flush_interval: Duration,
    max_queue_size: usize,
}

/// Accumulates per-request activity entries and flushes them by size or time.
#[derive(Clone)]
pub struct ActivityBatcher {
    inner: Arc<BatcherInner>,
}

impl ActivityBatcher {
    /// Creates a batcher with the default flush policy.
    #[must_use]
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self::with_policy(store, FLUSH_INTERVAL, MAX_QUEUE_SIZE)
    }

    /// Creates a batcher with an explicit flush policy.
    #[must_use]
    pub fn with_policy(
        store: Arc<dyn ActivityStore>,
        flush_interval: Duration,
        max_queue_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                store,
                state: Mutex::new(BatchState::default()),
                flush_interval,
                max_queue_size,
            }),
        }
    }

    /// Appends one entry, stamping it with the current time.
    ///
    /// Reaching the size threshold triggers an immediate flush off the
    /// caller's path; otherwise the one-shot flush timer is armed. Never
    /// fails or blocks the caller.
    pub fn enqueue(&self, record: ActivityLogRecord) {
        let entry = Stamped::now(record);
        let reached_capacity = match self.inner.state.lock() {
            Ok(mut state) => {
                state.queue.push(entry);
                state.queue.len() >= self.inner.max_queue_size
            }
            // Poisoned state: drop the entry, activity logging is diagnostic.
            Err(_) => return,
        };

        if reached_capacity {
            let batcher = self.clone();
            background::run(async move {
                batcher.flush().await;
                Ok(())
            });
        } else {
            self.schedule_flush();
        }
    }

    /// Number of entries waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .state
            .lock()
            .map(|state| state.queue.len())
            .unwrap_or(0)
    }

    /// Persists one entry immediately, bypassing the batch.
    ///
    /// For server-initiated actions where the actor and action are already
    /// known programmatically and no request middleware is involved.
    pub async fn record_now(&self, record: ActivityLogRecord) -> AppResult<()> {
        self.inner.store.persist(Stamped::now(record)).await
    }

    /// Drains the current batch and persists each entry in enqueue order.
    ///
    /// Per-entry persistence failures are logged and skipped; one bad record
    /// must not block delivery of the rest.
    pub async fn flush(&self) {
        let drained = match self.inner.state.lock() {
            Ok(mut state) if !state.queue.is_empty() => std::mem::take(&mut state.queue),
            _ => return,
        };

        for entry in drained {
            if let Err(error) = self.inner.store.persist(entry).await {
                warn!(error = %error, "failed to persist activity entry");
            }
        }
    }

    fn schedule_flush(&self) {
        {
            let Ok(mut state) = self.inner.state.lock() else {
                return;
            };
            if state.timer_armed {
                return;
            }
            state.timer_armed = true;
        }

        // The timer fires outside any request scope, so it is detached
        // directly instead of going through the lifecycle extender.
        let batcher = self.clone();
        drop(tokio::spawn(async move {
            tokio::time::sleep(batcher.inner.flush_interval).await;
            if let Ok(mut state) = batcher.inner.state.lock() {
                state.timer_armed = false;
            }
            batcher.flush().await;
        }));
    }
}
