//! Request-scoped execution context.
//!
//! The host installs a lifecycle extender and a queue binding at the
//! outermost request-entry point; arbitrarily deep async call chains read
//! them back here without threading two extra parameters through every
//! signature. Scoping rides on `tokio::task_local!`, so concurrent requests
//! interleaving on the same runtime never observe each other's handles.
//!
//! While a scope is active, setters and getters touch only that scope's
//! cells. A process-wide fallback pair exists for hosts that cannot provide
//! per-request isolation (tests, scope-less workers); it is consulted only
//! when no scope is active.

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use crate::ports::{LifecycleExtender, QueueBinding};

#[derive(Default)]
struct ScopeCells {
    lifecycle_extender: Mutex<Option<Arc<dyn LifecycleExtender>>>,
    queue_binding: Mutex<Option<Arc<dyn QueueBinding>>>,
}

tokio::task_local! {
    static CURRENT_SCOPE: ScopeCells;
}

static FALLBACK_LIFECYCLE_EXTENDER: RwLock<Option<Arc<dyn LifecycleExtender>>> =
    RwLock::new(None);
static FALLBACK_QUEUE_BINDING: RwLock<Option<Arc<dyn QueueBinding>>> = RwLock::new(None);

/// Runs a future inside a fresh, empty execution scope.
///
/// Code underneath sees isolated, initially-empty handles until the host
/// installs them; the scope unwinds when the future completes.
pub async fn with_scope<F: Future>(future: F) -> F::Output {
    CURRENT_SCOPE.scope(ScopeCells::default(), future).await
}

/// Installs the lifecycle extender for the current scope, or the process-wide
/// fallback when no scope is active. Never fails.
pub fn set_lifecycle_extender(handle: Arc<dyn LifecycleExtender>) {
    let scoped = CURRENT_SCOPE.try_with(|cells| {
        if let Ok(mut slot) = cells.lifecycle_extender.lock() {
            *slot = Some(handle.clone());
        }
    });

    if scoped.is_err() {
        if let Ok(mut slot) = FALLBACK_LIFECYCLE_EXTENDER.write() {
            *slot = Some(handle);
        }
    }
}

/// Returns the lifecycle extender visible from the calling context.
#[must_use]
pub fn lifecycle_extender() -> Option<Arc<dyn LifecycleExtender>> {
    match CURRENT_SCOPE.try_with(|cells| {
        cells
            .lifecycle_extender
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
    }) {
        Ok(scoped) => scoped,
        Err(_) => FALLBACK_LIFECYCLE_EXTENDER
            .read()
            .ok()
            .and_then(|slot| slot.clone()),
    }
}

/// Installs the queue binding for the current scope, or the process-wide
/// fallback when no scope is active. Never fails.
pub fn set_queue_binding(handle: Arc<dyn QueueBinding>) {
    let scoped = CURRENT_SCOPE.try_with(|cells| {
        if let Ok(mut slot) = cells.queue_binding.lock() {
            *slot = Some(handle.clone());
        }
    });

    if scoped.is_err() {
        if let Ok(mut slot) = FALLBACK_QUEUE_BINDING.write() {
            *slot = Some(handle);
        }
    }
}

/// Returns the queue binding visible from the calling context.
#[must_use]
pub fn queue_binding() -> Option<Arc<dyn QueueBinding>> {
    match CURRENT_SCOPE.try_with(|cells| {
        cells.queue_binding.lock().ok().and_then(|slot| slot.clone())
    }) {
        Ok(scoped) => scoped,
        Err(_) => FALLBACK_QUEUE_BINDING
            .read()
            .ok()
            .and_then(|slot| slot.clone()),
    }
}

/// Resets the current scope's handles and the process-wide fallbacks.
///
/// Intended for test isolation; production scopes end by unwinding instead.
pub fn clear() {
    let _ = CURRENT_SCOPE.try_with(|cells| {
        if let Ok(mut slot) = cells.lifecycle_extender.lock() {
            *slot = None;
        }
        if let Ok(mut slot) = cells.queue_binding.lock() {
            *slot = None;
        }
    });

    if let Ok(mut slot) = FALLBACK_LIFECYCLE_EXTENDER.write() {
        *slot = None;
    }
    if let Ok(mut slot) = FALLBACK_QUEUE_BINDING.write() {
        *slot = None;
    }
}
