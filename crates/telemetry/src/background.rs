//! Fire-and-forget execution of deferred work.
//!
//! This is the single chokepoint through which telemetry work leaves the
//! request path. The caller's control flow continues immediately; the task's
//! error is logged and swallowed, never propagated.

use std::future::Future;

use ardoise_core::AppResult;
use tracing::warn;

use crate::ports::BackgroundTask;
use crate::scope;

/// Defers a task past the caller's control flow.
///
/// When the current scope carries a lifecycle extender, the task is handed
/// to it so the host keeps the process alive until the task settles. Without
/// one the task is detached onto the runtime, which is the degraded mode for
/// hosts with no teardown to outlive.
pub fn run<F>(task: F)
where
    F: Future<Output = AppResult<()>> + Send + 'static,
{
    let wrapped: BackgroundTask = Box::pin(async move {
        if let Err(error) = task.await {
            warn!(error = %error, "background task failed");
        }
    });

    match scope::lifecycle_extender() {
        Some(extender) => extender.extend(wrapped),
        None => {
            drop(tokio::spawn(wrapped));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ardoise_core::AppError;

    use super::run;
    use crate::ports::{BackgroundTask, LifecycleExtender};
    use crate::scope;

    #[derive(Default)]
    struct CountingExtender {
        accepted: AtomicUsize,
    }

    impl LifecycleExtender for CountingExtender {
        fn extend(&self, task: BackgroundTask) {
            self.accepted.fetch_add(1, Ordering::SeqCst);
            drop(tokio::spawn(task));
        }
    }

    #[tokio::test]
    async fn rejecting_task_never_surfaces_at_the_call_site() {
        scope::with_scope(async {
            let observed = Arc::new(AtomicUsize::new(0));
            let observed_in_task = observed.clone();

            run(async move {
                observed_in_task.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Internal("transport unavailable".to_owned()))
            });

            // The caller reaches this point immediately and unharmed.
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            assert_eq!(observed.load(Ordering::SeqCst), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn task_is_handed_to_the_scoped_extender_when_present() {
        scope::with_scope(async {
            let extender = Arc::new(CountingExtender::default());
            scope::set_lifecycle_extender(extender.clone());

            run(async { Ok(()) });

            assert_eq!(extender.accepted.load(Ordering::SeqCst), 1);
        })
        .await;
    }
}
