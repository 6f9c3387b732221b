//! Background telemetry pipeline: request-scoped execution context,
//! fire-and-forget delivery, and batched activity persistence.
//!
//! Everything in this crate is best-effort by construction. No operation
//! exposed here may fail, block, or delay the request path it instruments;
//! failures are logged through `tracing` and discarded.

#![forbid(unsafe_code)]

mod analytics;
pub mod background;
mod batcher;
mod ports;
pub mod producer;
pub mod scope;

pub use analytics::{ActivityAnalytics, EndpointUsage};
pub use batcher::{ActivityBatcher, FLUSH_INTERVAL, MAX_QUEUE_SIZE};
pub use ports::{
    ActivityStore, BackgroundTask, LifecycleExtender, QueueBinding, TelemetrySink,
    TrackedTaskExtender,
};
